use crate::dialect::LimitStrategy;
use crate::error::SqlMiddlewareDbError;
use crate::formatter::Formatter;
use crate::request::{Direction, JoinKind, Method, QueryRequest};

use super::{SqlBuf, int_binding, render_where};

// Upper row bound used by rownum paging when only an offset is given.
const ROWNUM_NO_LIMIT: u64 = 10_000_000_000_000;

/// Render a select (including any paging) in neutral form.
pub(crate) fn compile_select(
    fmt: &Formatter<'_>,
    req: &QueryRequest,
) -> Result<SqlBuf, SqlMiddlewareDbError> {
    let mut buf = SqlBuf::default();
    buf.push("select ");
    if req.distinct {
        buf.push("distinct ");
    }

    let columns: Vec<&str> = match (&req.pluck, req.columns.is_empty()) {
        (Some(pluck), true) => vec![pluck.as_str()],
        _ => req.columns.iter().map(String::as_str).collect(),
    };
    buf.push(&fmt.columnize(&columns));
    buf.push(" from ");
    buf.push(&fmt.identifier(&req.table));

    for join in &req.joins {
        let kind = match join.kind {
            JoinKind::Inner => "inner join",
            JoinKind::Left => "left join",
            JoinKind::Right => "right join",
        };
        buf.push(&format!(
            " {kind} {} on {} {} {}",
            fmt.identifier(&join.table),
            fmt.identifier(&join.left),
            join.op.as_sql(),
            fmt.identifier(&join.right)
        ));
    }

    render_where(fmt, &req.predicates, &mut buf)?;

    if !req.order_by.is_empty() {
        let order = req
            .order_by
            .iter()
            .map(|o| {
                let dir = match o.direction {
                    Direction::Asc => "asc",
                    Direction::Desc => "desc",
                };
                format!("{} {dir}", fmt.identifier(&o.column))
            })
            .collect::<Vec<_>>()
            .join(", ");
        buf.push(" order by ");
        buf.push(&order);
    }

    let limit = if req.method == Method::First {
        Some(1)
    } else {
        req.limit
    };
    apply_paging(fmt, buf, limit, req.offset, !req.order_by.is_empty())
}

fn apply_paging(
    fmt: &Formatter<'_>,
    mut inner: SqlBuf,
    limit: Option<u64>,
    offset: Option<u64>,
    ordered: bool,
) -> Result<SqlBuf, SqlMiddlewareDbError> {
    if limit.is_none() && offset.is_none() {
        return Ok(inner);
    }

    match fmt.dialect().limit_strategy {
        LimitStrategy::LimitOffset {
            offset_requires_limit,
        } => {
            match (limit, offset) {
                (Some(limit), _) => {
                    inner.push(" limit ");
                    inner.bind(int_binding(limit, "limit")?);
                }
                (None, Some(_)) if offset_requires_limit => {
                    inner.push(" limit ");
                    inner.bind(crate::types::RowValues::Int(-1));
                }
                (None, _) => {}
            }
            if let Some(offset) = offset {
                inner.push(" offset ");
                inner.bind(int_binding(offset, "offset")?);
            }
            Ok(inner)
        }
        LimitStrategy::OffsetFetch => {
            if !ordered {
                inner.push(" order by (select 0)");
            }
            inner.push(" offset ");
            inner.bind(int_binding(offset.unwrap_or(0), "offset")?);
            inner.push(" rows");
            if let Some(limit) = limit {
                inner.push(" fetch next ");
                inner.bind(int_binding(limit, "limit")?);
                inner.push(" rows only");
            }
            Ok(inner)
        }
        LimitStrategy::RowNum => match offset {
            None => {
                let mut wrapped = inner.wrap("select * from (", ") where rownum <= ");
                wrapped.bind(int_binding(limit.unwrap_or(ROWNUM_NO_LIMIT), "limit")?);
                Ok(wrapped)
            }
            Some(offset) => {
                let end_row = offset
                    .checked_add(limit.unwrap_or(ROWNUM_NO_LIMIT))
                    .ok_or_else(|| {
                        SqlMiddlewareDbError::CompilationError(
                            "limit plus offset overflows".to_string(),
                        )
                    })?;
                let mut first = inner.wrap(
                    "select row_.*, ROWNUM rownum_ from (",
                    ") row_ where rownum <= ",
                );
                first.bind(int_binding(end_row, "limit")?);
                let mut outer = first.wrap("select * from (", ") where rownum_ > ");
                outer.bind(int_binding(offset, "offset")?);
                Ok(outer)
            }
        },
    }
}
