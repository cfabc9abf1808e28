//! Single-line functional rendering of XR, for tests and the CLI.
//!
//! Bind identifiers render as `#seq`; the scope is omitted since it is the
//! same for every identifier of one compilation.

use std::fmt::{self, Display, Formatter, Write};

use crate::xr::{
    Action, Assignment, BatchAction, Direction, Expr, JoinKind, Literal, Query, Returning,
    SelectClause, SelectStep, SortKey, Xr,
};

impl Display for Xr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(q) => q.fmt(f),
            Self::Expr(e) => e.fmt(f),
            Self::Action(a) => a.fmt(f),
            Self::Batch(b) => b.fmt(f),
        }
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity { name, .. } => write!(f, "Entity({name})"),
            Self::Ident(id) => f.write_str(&id.name),
            Self::Filter { head, id, body } => write!(f, "Filter({head}, {}, {body})", id.name),
            Self::Map { head, id, body } => write!(f, "Map({head}, {}, {body})", id.name),
            Self::FlatMap { head, id, body } => {
                write!(f, "FlatMap({head}, {}, {body})", id.name)
            }
            Self::SortBy { head, id, keys } => {
                write!(f, "SortBy({head}, {}, ", id.name)?;
                write_keys(f, keys)?;
                f.write_char(')')
            }
            Self::Take { head, count } => write!(f, "Take({head}, {count})"),
            Self::Drop { head, count } => write!(f, "Drop({head}, {count})"),
            Self::Distinct { head } => write!(f, "Distinct({head})"),
            Self::Union { left, right, all } => {
                let name = if *all { "UnionAll" } else { "Union" };
                write!(f, "{name}({left}, {right})")
            }
            Self::Select(clause) => clause.fmt(f),
            Self::Tag { bid, .. } => write!(f, "Tag(#{})", bid.seq()),
            Self::FromExpr(e) => write!(f, "FromExpr({e})"),
        }
    }
}

impl Display for SelectClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Select([")?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match step {
                SelectStep::From { id, source } => write!(f, "From({}, {source})", id.name)?,
                SelectStep::Join {
                    id,
                    kind,
                    source,
                    on,
                } => {
                    let kind = match kind {
                        JoinKind::Inner => "Inner",
                        JoinKind::Left => "Left",
                    };
                    write!(f, "Join({}, {kind}, {source}, {on})", id.name)?
                }
                SelectStep::Assign { ids, value } => {
                    let names: Vec<&str> = ids.iter().map(|id| id.name.as_str()).collect();
                    write!(f, "Assign({}, {value})", names.join(", "))?
                }
            }
        }
        f.write_char(']')?;
        if let Some(filter) = &self.filter {
            write!(f, ", where={filter}")?;
        }
        if let Some(group_by) = &self.group_by {
            write!(f, ", groupBy={group_by}")?;
        }
        if let Some(keys) = &self.sort_by {
            f.write_str(", sortBy=")?;
            write_keys(f, keys)?;
        }
        write!(f, ", result={})", self.result)
    }
}

fn write_keys(f: &mut Formatter<'_>, keys: &[SortKey]) -> fmt::Result {
    f.write_char('[')?;
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        let dir = match key.direction {
            Direction::Asc => "Asc",
            Direction::Desc => "Desc",
        };
        write!(f, "{} {dir}", key.expr)?;
    }
    f.write_char(']')
}

fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_char('[')?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item.fmt(f)?;
    }
    f.write_char(']')
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(id) => f.write_str(&id.name),
            Self::Const { value, .. } => match value {
                Literal::Null => f.write_str("null"),
                Literal::Bool(b) => write!(f, "{b}"),
                Literal::Int(n) => write!(f, "{n}"),
                Literal::Double(d) => write!(f, "{d:?}"),
                Literal::String(s) => write!(f, "{s:?}"),
            },
            Self::Binary { op, left, right } => {
                write!(f, "BinaryOp({left}, {}, {right})", op.symbol())
            }
            Self::Unary { op, operand } => write!(f, "UnaryOp({}, {operand})", op.symbol()),
            Self::Property { of, name, .. } => write!(f, "Property({of}, {name})"),
            Self::When { branches, otherwise } => {
                f.write_str("When([")?;
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} -> {}", branch.cond, branch.then)?;
                }
                write!(f, "], else={otherwise})")
            }
            Self::Product { name, fields } => {
                write!(f, "Product({name}")?;
                for (field, value) in fields {
                    write!(f, ", {field}={value}")?;
                }
                f.write_char(')')
            }
            Self::Block { bindings, output } => {
                f.write_str("Block([")?;
                for (i, (id, value)) in bindings.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} = {value}", id.name)?;
                }
                write!(f, "], {output})")
            }
            Self::MethodCall {
                head, name, args, ..
            } => {
                write!(f, "MethodCall({head}, {name}, ")?;
                write_list(f, args)?;
                f.write_char(')')
            }
            Self::Param { bid, .. } => write!(f, "Param(#{})", bid.seq()),
            Self::Tag { bid, .. } => write!(f, "Tag(#{})", bid.seq()),
            Self::Subquery(q) => write!(f, "Subquery({q})"),
        }
    }
}

impl Display for Assignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} := {}", self.property, self.value)
    }
}

fn write_returning(f: &mut Formatter<'_>, returning: &Option<Returning>) -> fmt::Result {
    if let Some(r) = returning {
        write!(f, ", returning={} -> {}", r.id.name, r.output)?;
    }
    Ok(())
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert {
                target,
                alias,
                assignments,
                returning,
            } => {
                write!(f, "Insert({target}, {}, ", alias.name)?;
                write_list(f, assignments)?;
                write_returning(f, returning)?;
                f.write_char(')')
            }
            Self::Update {
                target,
                alias,
                assignments,
                filter,
                returning,
            } => {
                write!(f, "Update({target}, {}, ", alias.name)?;
                write_list(f, assignments)?;
                if let Some(filter) = filter {
                    write!(f, ", where={filter}")?;
                }
                write_returning(f, returning)?;
                f.write_char(')')
            }
            Self::Delete {
                target,
                alias,
                filter,
                returning,
            } => {
                write!(f, "Delete({target}, {}", alias.name)?;
                if let Some(filter) = filter {
                    write!(f, ", where={filter}")?;
                }
                write_returning(f, returning)?;
                f.write_char(')')
            }
            Self::Tag { bid } => write!(f, "Tag(#{})", bid.seq()),
        }
    }
}

impl Display for BatchAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Batch({}, {})", self.alias.name, self.action)
    }
}
