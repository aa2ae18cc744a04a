use crate::algebra::{BoundAggregate, Expression, Operation};
use crate::error::AlgebraError;
use crate::syntax::{
    self, Aggregate, GroupCondition, Projection, Query, QueryForm, SelectItem, Term,
    in_scope_variables,
};
use crate::term::{NamedNodePattern, Variable};
use crate::to_algebra::AlgebraContext;
use tracing::trace;

impl AlgebraContext {
    pub(super) fn translate_query(&mut self, query: &Query) -> Result<Operation, AlgebraError> {
        self.register_prologue(&query.prologue)?;
        let op = match &query.where_clause {
            Some(group) => self.translate_group(group)?,
            None => Operation::bgp(Vec::new()),
        };
        self.translate_aggregates(query, op)
    }

    /// Wraps the translated `WHERE` clause into grouping, solution modifiers and the query form.
    fn translate_aggregates(
        &mut self,
        query: &Query,
        mut op: Operation,
    ) -> Result<Operation, AlgebraError> {
        // Aggregates are replaced by the variables the Group operator binds them to
        let mut aggregates = Vec::new();
        let items = match &query.form {
            QueryForm::Select {
                projection: Projection::Items(items),
                ..
            } => Some(
                items
                    .iter()
                    .map(|item| match item {
                        SelectItem::Variable(variable) => SelectItem::Variable(variable.clone()),
                        SelectItem::Bind {
                            expression,
                            variable,
                        } => SelectItem::Bind {
                            expression: self.map_aggregates(expression, &mut aggregates),
                            variable: variable.clone(),
                        },
                    })
                    .collect::<Vec<_>>(),
            ),
            _ => None,
        };
        let having = query
            .modifiers
            .having
            .iter()
            .map(|expression| self.map_aggregates(expression, &mut aggregates))
            .collect::<Vec<_>>();
        let order_by = query
            .modifiers
            .order_by
            .iter()
            .map(|ordering| {
                (
                    self.map_aggregates(&ordering.expression, &mut aggregates),
                    ordering.descending,
                )
            })
            .collect::<Vec<_>>();

        if !query.modifiers.group_by.is_empty() || !aggregates.is_empty() {
            let mut variables = Vec::new();
            for condition in &query.modifiers.group_by {
                match condition {
                    GroupCondition::Variable(variable) => variables.push(variable.clone()),
                    GroupCondition::Bind {
                        expression,
                        variable,
                    } => {
                        op = Operation::extend(
                            op,
                            variable.clone(),
                            self.translate_expression(expression)?,
                        );
                        variables.push(variable.clone());
                    }
                    GroupCondition::Expression(expression) => {
                        let variable = self.fresh_variable();
                        op = Operation::extend(
                            op,
                            variable.clone(),
                            self.translate_expression(expression)?,
                        );
                        variables.push(variable);
                    }
                }
            }
            let aggregates = aggregates
                .iter()
                .map(|(variable, aggregate)| {
                    Ok(BoundAggregate::new(
                        variable.clone(),
                        self.translate_aggregate(aggregate)?,
                    ))
                })
                .collect::<Result<Vec<_>, AlgebraError>>()?;
            op = Operation::group(op, variables, aggregates);
        }

        for expression in &having {
            op = Operation::filter(op, self.translate_expression(expression)?);
        }

        if let Some(values) = &query.values {
            op = Operation::join(vec![op, self.translate_values(values)?], true)?;
        }

        let mut projection = Vec::new();
        if let Some(items) = items {
            for item in items {
                match item {
                    SelectItem::Variable(variable) => projection.push(variable),
                    SelectItem::Bind {
                        expression,
                        variable,
                    } => {
                        op = Operation::extend(
                            op,
                            variable.clone(),
                            self.translate_expression(&expression)?,
                        );
                        projection.push(variable);
                    }
                }
            }
        } else if let (
            QueryForm::Select { .. } | QueryForm::Describe { .. },
            Some(group),
        ) = (&query.form, &query.where_clause)
        {
            // SELECT * and DESCRIBE *, sorted for a stable output
            projection.extend(in_scope_variables(group));
        }

        if !order_by.is_empty() {
            let expressions = order_by
                .iter()
                .map(|(expression, descending)| {
                    let expression = self.translate_expression(expression)?;
                    Ok(if *descending {
                        Expression::operator("desc", vec![expression])
                    } else {
                        expression
                    })
                })
                .collect::<Result<Vec<_>, AlgebraError>>()?;
            op = Operation::order_by(op, expressions);
        }

        op = match &query.form {
            QueryForm::Select {
                distinct, reduced, ..
            } => {
                let mut op = Operation::project(op, projection);
                if *distinct {
                    op = Operation::distinct(op);
                }
                if *reduced {
                    op = Operation::reduced(op);
                }
                op
            }
            QueryForm::Construct { template } => {
                Operation::construct(op, self.translate_template(template, None)?)
            }
            QueryForm::Ask => Operation::ask(op),
            QueryForm::Describe { targets } => {
                let terms = if targets.is_empty() {
                    projection.into_iter().map(NamedNodePattern::from).collect()
                } else {
                    targets
                        .iter()
                        .map(|target| self.named_node_pattern(target))
                        .collect::<Result<_, _>>()?
                };
                Operation::describe(op, terms)
            }
        };

        // After CONSTRUCT and DESCRIBE: the solution modifiers apply to their output
        let offset = query.modifiers.offset.unwrap_or(0);
        if query.modifiers.limit.is_some() || offset > 0 {
            op = Operation::slice(op, offset, query.modifiers.limit);
        }

        if !query.datasets.is_empty() {
            let (default, named) = self.dataset(&query.datasets)?;
            op = Operation::from_dataset(op, default, named);
        }
        Ok(op)
    }

    /// Replaces the aggregates of an expression by variables.
    ///
    /// Aggregates equal once their source locations are removed share the same variable.
    fn map_aggregates(
        &mut self,
        expression: &syntax::Expression,
        aggregates: &mut Vec<(Variable, Aggregate)>,
    ) -> syntax::Expression {
        match expression {
            syntax::Expression::Aggregate(aggregate) => {
                let aggregate = aggregate.without_locations();
                let variable = if let Some((variable, _)) =
                    aggregates.iter().find(|(_, known)| *known == aggregate)
                {
                    trace!(variable = %variable, "aggregate reused");
                    variable.clone()
                } else {
                    let variable = self.fresh_variable();
                    aggregates.push((variable.clone(), aggregate));
                    variable
                };
                Term::Variable(variable).into()
            }
            syntax::Expression::FunctionCall {
                function,
                args,
                distinct,
                location,
            } => syntax::Expression::FunctionCall {
                function: function.clone(),
                args: args
                    .iter()
                    .map(|arg| self.map_aggregates(arg, aggregates))
                    .collect(),
                distinct: *distinct,
                location: *location,
            },
            syntax::Expression::Operation {
                operator,
                args,
                location,
            } => syntax::Expression::Operation {
                operator: operator.clone(),
                args: args
                    .iter()
                    .map(|arg| self.map_aggregates(arg, aggregates))
                    .collect(),
                location: *location,
            },
            expression => expression.clone(),
        }
    }
}
