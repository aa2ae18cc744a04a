#![expect(clippy::panic_in_result_fn)]

use sparalgebra::algebra::{Operation, Pattern, Update};
use sparalgebra::syntax::{
    GraphRef, GroupPattern, Iri, LiteralTerm, Quads, Sparql, Term, Triple, TripleLike,
    UpdateOperation, UpdateUnit,
};
use sparalgebra::term::{GraphTarget, NamedNode, Variable};
use sparalgebra::{TranslationOptions, to_algebra, to_syntax};

fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

fn iri(local: &str) -> Iri {
    Iri::full(format!("http://example.com/{local}"))
}

fn request(operations: Vec<UpdateOperation>) -> Sparql {
    Sparql::Update(sparalgebra::syntax::Update {
        operations: operations.into_iter().map(UpdateUnit::from).collect(),
    })
}

fn quads_options() -> TranslationOptions {
    TranslationOptions::new().with_quads()
}

fn operations(op: &Operation) -> Result<Vec<UpdateOperation>, Box<dyn std::error::Error>> {
    let Sparql::Update(update) = to_syntax(op)? else {
        return Err("an update was expected".into());
    };
    Ok(update
        .operations
        .into_iter()
        .filter_map(|unit| unit.operation)
        .collect())
}

#[test]
fn test_insert_data_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let triples: Vec<TripleLike> = vec![
        Triple::new(iri("s"), iri("p"), LiteralTerm::Simple("o".into())).into(),
    ];
    let insert = UpdateOperation::InsertData {
        data: vec![
            Quads::Triples(triples.clone()),
            Quads::Graph {
                graph: Term::Iri(iri("g")),
                triples,
            },
        ],
    };
    let op = to_algebra(&request(vec![insert.clone()]), &quads_options())?;
    assert_eq!(
        op.to_string(),
        "(deleteinsert (insert (triple <http://example.com/s> <http://example.com/p> \"o\") (quad <http://example.com/g> <http://example.com/s> <http://example.com/p> \"o\")))"
    );
    assert_eq!(operations(&op)?, [insert]);
    Ok(())
}

#[test]
fn test_insert_data_requires_quads() {
    let insert = UpdateOperation::InsertData {
        data: vec![Quads::Triples(vec![
            Triple::new(iri("s"), iri("p"), iri("o")).into(),
        ])],
    };
    assert!(
        to_algebra(&request(vec![insert]), &TranslationOptions::new())
            .is_err_and(|e| e.is_unsupported())
    );
}

#[test]
fn test_delete_where_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let delete = UpdateOperation::DeleteWhere {
        data: vec![Quads::Triples(vec![
            Triple::new(var("s"), iri("p"), var("o")).into(),
        ])],
    };
    let op = to_algebra(&request(vec![delete.clone()]), &quads_options())?;
    assert_eq!(operations(&op)?, [delete]);
    Ok(())
}

#[test]
fn test_with_becomes_graph_blocks() -> Result<(), Box<dyn std::error::Error>> {
    let triples: Vec<TripleLike> = vec![Triple::new(var("s"), iri("p"), var("o")).into()];
    let modify = UpdateOperation::Modify {
        with: Some(iri("g")),
        delete: vec![Quads::Triples(triples.clone())],
        insert: Vec::new(),
        using: Vec::new(),
        where_clause: GroupPattern::new(vec![sparalgebra::syntax::Pattern::Bgp(
            triples.clone(),
        )]),
    };
    let op = to_algebra(&request(vec![modify]), &quads_options())?;
    // The WHERE clause matches the deleted quads: the short form is enough
    assert_eq!(
        operations(&op)?,
        [UpdateOperation::DeleteWhere {
            data: vec![Quads::Graph {
                graph: Term::Iri(iri("g")),
                triples,
            }],
        }]
    );
    Ok(())
}

#[test]
fn test_graph_management_sequence() -> Result<(), Box<dyn std::error::Error>> {
    let g = NamedNode::new("http://example.com/g")?;
    let op = Operation::composite_update(vec![
        Update::create_graph(g.clone(), false),
        Update::drop_graph(GraphTarget::NamedGraphs, true),
    ]);
    assert_eq!(
        operations(&op)?,
        [
            UpdateOperation::Create {
                silent: false,
                graph: Iri::from(g),
            },
            UpdateOperation::Drop {
                silent: true,
                target: GraphRef::Named,
            },
        ]
    );
    Ok(())
}

#[test]
fn test_modify_where_keeps_its_graphs() -> Result<(), Box<dyn std::error::Error>> {
    let s = var("s");
    let o = var("o");
    let p = NamedNode::new("http://example.com/p")?;
    let g = NamedNode::new("http://example.com/g")?;
    let update = Update::delete_insert(
        Vec::new(),
        vec![Pattern::new(s.clone(), p.clone(), o.clone(), None)],
        Some(Operation::bgp(vec![
            Pattern::new(s.clone(), p.clone(), o.clone(), Some(g.clone().into())),
            Pattern::new(o.clone(), p.clone(), s.clone(), None),
        ])),
    );
    let operations = operations(&update.into())?;
    let [UpdateOperation::Modify { where_clause, .. }] = operations.as_slice() else {
        return Err("a single DELETE/INSERT operation was expected".into());
    };
    assert_eq!(
        *where_clause,
        GroupPattern::new(vec![
            sparalgebra::syntax::Pattern::Graph {
                name: Term::Iri(Iri::from(g)),
                group: GroupPattern::new(vec![sparalgebra::syntax::Pattern::Bgp(vec![
                    Triple::new(s.clone(), Iri::from(p.clone()), o.clone()).into()
                ])]),
            },
            sparalgebra::syntax::Pattern::Bgp(vec![Triple::new(o, Iri::from(p), s).into()]),
        ])
    );
    Ok(())
}

#[test]
fn test_delete_with_empty_where_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let modify = UpdateOperation::Modify {
        with: None,
        delete: vec![Quads::Triples(vec![
            Triple::new(var("s"), iri("p"), var("o")).into(),
        ])],
        insert: Vec::new(),
        using: Vec::new(),
        where_clause: GroupPattern::default(),
    };
    let op = to_algebra(&request(vec![modify.clone()]), &quads_options())?;
    let Operation::Update(Update::DeleteInsert(delete_insert)) = &op else {
        return Err("a DELETE/INSERT operation was expected".into());
    };
    assert_eq!(
        delete_insert.pattern.as_deref(),
        Some(&Operation::bgp(Vec::new()))
    );
    // Not DELETE WHERE: an empty WHERE matches once and deletes nothing with variables
    let back = operations(&op)?;
    assert_eq!(back, [modify]);
    assert_eq!(to_algebra(&request(back), &quads_options())?, op);
    Ok(())
}

#[test]
fn test_insert_with_empty_where_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let modify = UpdateOperation::Modify {
        with: None,
        delete: Vec::new(),
        insert: vec![Quads::Triples(vec![
            Triple::new(var("s"), iri("p"), var("o")).into(),
        ])],
        using: Vec::new(),
        where_clause: GroupPattern::default(),
    };
    let op = to_algebra(&request(vec![modify.clone()]), &quads_options())?;
    assert_eq!(operations(&op)?, [modify]);
    Ok(())
}

#[test]
fn test_templates_with_variables_are_not_data() -> Result<(), Box<dyn std::error::Error>> {
    let s = var("s");
    let p = NamedNode::new("http://example.com/p")?;
    let update = Update::delete_insert(
        vec![Pattern::new(s.clone(), p.clone(), s.clone(), None)],
        Vec::new(),
        None,
    );
    assert_eq!(
        operations(&update.into())?,
        [UpdateOperation::Modify {
            with: None,
            delete: vec![Quads::Triples(vec![
                Triple::new(s.clone(), Iri::from(p), s).into()
            ])],
            insert: Vec::new(),
            using: Vec::new(),
            where_clause: GroupPattern::default(),
        }]
    );
    Ok(())
}

#[test]
fn test_bgp_in_two_graphs_is_split() -> Result<(), Box<dyn std::error::Error>> {
    let s = var("s");
    let o = var("o");
    let p = NamedNode::new("http://example.com/p")?;
    let g = NamedNode::new("http://example.com/g")?;
    let h = NamedNode::new("http://example.com/h")?;
    let update = Update::delete_insert(
        Vec::new(),
        vec![Pattern::new(s.clone(), p.clone(), o.clone(), None)],
        Some(Operation::bgp(vec![
            Pattern::new(s.clone(), p.clone(), o.clone(), Some(g.clone().into())),
            Pattern::new(o.clone(), p.clone(), s.clone(), Some(h.clone().into())),
        ])),
    );
    let operations = operations(&update.into())?;
    let [UpdateOperation::Modify { where_clause, .. }] = operations.as_slice() else {
        return Err("a single DELETE/INSERT operation was expected".into());
    };
    let graph = |name: NamedNode, triple: Triple| sparalgebra::syntax::Pattern::Graph {
        name: Term::Iri(Iri::from(name)),
        group: GroupPattern::new(vec![sparalgebra::syntax::Pattern::Bgp(vec![triple.into()])]),
    };
    assert_eq!(
        *where_clause,
        GroupPattern::new(vec![
            graph(g, Triple::new(s.clone(), Iri::from(p.clone()), o.clone())),
            graph(h, Triple::new(o, Iri::from(p), s)),
        ])
    );
    Ok(())
}
