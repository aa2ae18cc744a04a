use crate::algebra::{Metadata, Operation, Pattern, fmt_sse_list};
use crate::term::*;
use std::fmt;

/// A single [SPARQL 1.1 update operation](https://www.w3.org/TR/sparql11-update/#formalModelGraphUpdate).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Update {
    /// [DELETE/INSERT](https://www.w3.org/TR/sparql11-update/#def_deleteinsertoperation).
    ///
    /// `INSERT DATA`, `DELETE DATA` and `DELETE WHERE` are normalized to this form.
    DeleteInsert(DeleteInsert),
    /// [LOAD](https://www.w3.org/TR/sparql11-update/#def_loadoperation).
    Load(Load),
    /// [CLEAR](https://www.w3.org/TR/sparql11-update/#def_clearoperation).
    Clear(GraphManagement),
    /// [CREATE](https://www.w3.org/TR/sparql11-update/#def_createoperation).
    Create(CreateGraph),
    /// [DROP](https://www.w3.org/TR/sparql11-update/#def_dropoperation).
    Drop(GraphManagement),
    /// [ADD](https://www.w3.org/TR/sparql11-update/#def_addoperation).
    Add(GraphTransfer),
    /// [MOVE](https://www.w3.org/TR/sparql11-update/#def_moveoperation).
    Move(GraphTransfer),
    /// [COPY](https://www.w3.org/TR/sparql11-update/#def_copyoperation).
    Copy(GraphTransfer),
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct DeleteInsert {
    pub delete: Vec<Pattern>,
    pub insert: Vec<Pattern>,
    /// The `WHERE` clause, `None` for the `DATA` forms.
    pub pattern: Option<Box<Operation>>,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Load {
    pub source: NamedNode,
    pub destination: Option<NamedNode>,
    pub silent: bool,
    pub metadata: Metadata,
}

/// The shared shape of `CLEAR` and `DROP`.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct GraphManagement {
    pub target: GraphTarget,
    pub silent: bool,
    pub metadata: Metadata,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct CreateGraph {
    pub graph: NamedNode,
    pub silent: bool,
    pub metadata: Metadata,
}

/// The shared shape of `ADD`, `MOVE` and `COPY`.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct GraphTransfer {
    pub source: GraphName,
    pub destination: GraphName,
    pub silent: bool,
    pub metadata: Metadata,
}

impl Update {
    pub fn metadata(&self) -> &Metadata {
        match self {
            Self::DeleteInsert(u) => &u.metadata,
            Self::Load(u) => &u.metadata,
            Self::Clear(u) | Self::Drop(u) => &u.metadata,
            Self::Create(u) => &u.metadata,
            Self::Add(u) | Self::Move(u) | Self::Copy(u) => &u.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        match self {
            Self::DeleteInsert(u) => &mut u.metadata,
            Self::Load(u) => &mut u.metadata,
            Self::Clear(u) | Self::Drop(u) => &mut u.metadata,
            Self::Create(u) => &mut u.metadata,
            Self::Add(u) | Self::Move(u) | Self::Copy(u) => &mut u.metadata,
        }
    }
}

fn fmt_silent(f: &mut fmt::Formatter<'_>, silent: bool) -> fmt::Result {
    if silent {
        f.write_str(" silent")?;
    }
    Ok(())
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteInsert(u) => {
                f.write_str("(deleteinsert")?;
                if !u.delete.is_empty() {
                    f.write_str(" (delete ")?;
                    fmt_sse_list(f, &u.delete)?;
                    f.write_str(")")?;
                }
                if !u.insert.is_empty() {
                    f.write_str(" (insert ")?;
                    fmt_sse_list(f, &u.insert)?;
                    f.write_str(")")?;
                }
                if let Some(pattern) = &u.pattern {
                    write!(f, " {pattern}")?;
                }
                f.write_str(")")
            }
            Self::Load(u) => {
                f.write_str("(load")?;
                fmt_silent(f, u.silent)?;
                write!(f, " {}", u.source)?;
                if let Some(destination) = &u.destination {
                    write!(f, " {destination}")?;
                }
                f.write_str(")")
            }
            Self::Clear(u) => {
                f.write_str("(clear")?;
                fmt_silent(f, u.silent)?;
                write!(f, " {})", u.target)
            }
            Self::Create(u) => {
                f.write_str("(create")?;
                fmt_silent(f, u.silent)?;
                write!(f, " {})", u.graph)
            }
            Self::Drop(u) => {
                f.write_str("(drop")?;
                fmt_silent(f, u.silent)?;
                write!(f, " {})", u.target)
            }
            Self::Add(u) => fmt_transfer(f, "add", u),
            Self::Move(u) => fmt_transfer(f, "move", u),
            Self::Copy(u) => fmt_transfer(f, "copy", u),
        }
    }
}

fn fmt_transfer(f: &mut fmt::Formatter<'_>, name: &str, u: &GraphTransfer) -> fmt::Result {
    write!(f, "({name}")?;
    fmt_silent(f, u.silent)?;
    write!(f, " {} {})", u.source, u.destination)
}
