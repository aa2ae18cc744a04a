use crate::syntax::{DatasetClause, Declaration, GroupPattern, Iri, Term, TripleLike};

/// A [SPARQL update](https://www.w3.org/TR/sparql11-update/#rUpdate) request.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct Update {
    pub operations: Vec<UpdateUnit>,
}

/// One `;` separated part of an update request, with the declarations before it.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct UpdateUnit {
    pub prologue: Vec<Declaration>,
    /// `None` for a trailing prologue without operation.
    pub operation: Option<UpdateOperation>,
}

impl From<UpdateOperation> for UpdateUnit {
    #[inline]
    fn from(operation: UpdateOperation) -> Self {
        Self {
            prologue: Vec::new(),
            operation: Some(operation),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum UpdateOperation {
    Load {
        silent: bool,
        source: Iri,
        destination: Option<Iri>,
    },
    Clear {
        silent: bool,
        target: GraphRef,
    },
    Create {
        silent: bool,
        graph: Iri,
    },
    Drop {
        silent: bool,
        target: GraphRef,
    },
    Add {
        silent: bool,
        source: GraphOrDefault,
        destination: GraphOrDefault,
    },
    Move {
        silent: bool,
        source: GraphOrDefault,
        destination: GraphOrDefault,
    },
    Copy {
        silent: bool,
        source: GraphOrDefault,
        destination: GraphOrDefault,
    },
    InsertData {
        data: Vec<Quads>,
    },
    DeleteData {
        data: Vec<Quads>,
    },
    DeleteWhere {
        data: Vec<Quads>,
    },
    /// `WITH ... DELETE { ... } INSERT { ... } USING ... WHERE { ... }`
    Modify {
        with: Option<Iri>,
        delete: Vec<Quads>,
        insert: Vec<Quads>,
        using: Vec<DatasetClause>,
        where_clause: GroupPattern,
    },
}

/// A triples block of an update template, optionally inside `GRAPH g { ... }`.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Quads {
    Triples(Vec<TripleLike>),
    Graph {
        graph: Term,
        triples: Vec<TripleLike>,
    },
}

/// The target of `CLEAR` and `DROP`.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum GraphRef {
    Default,
    Named,
    All,
    Graph(Iri),
}

/// The source or destination of `ADD`, `MOVE` and `COPY`.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum GraphOrDefault {
    Default,
    Graph(Iri),
}
