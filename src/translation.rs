use std::borrow::Cow;

/// Dialect-neutral placeholder the compiler writes for every binding.
pub const NEUTRAL_PLACEHOLDER: char = '?';

/// Target placeholder style for positioned bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// Bare `?` (`SQLite`, `MySQL`). The neutral token is already correct.
    Question,
    /// `PostgreSQL`-style `$1`.
    Dollar,
    /// Oracle-style `:1`.
    Colon,
    /// SQL Server-style `@p1`.
    AtP,
}

impl PlaceholderStyle {
    /// Render the token for a 1-based binding index.
    #[must_use]
    pub fn token(self, index: usize) -> String {
        match self {
            PlaceholderStyle::Question => NEUTRAL_PLACEHOLDER.to_string(),
            PlaceholderStyle::Dollar => format!("${index}"),
            PlaceholderStyle::Colon => format!(":{index}"),
            PlaceholderStyle::AtP => format!("@p{index}"),
        }
    }
}

/// Rewrite every neutral `?` into the target positional style, numbering from 1, left to right.
///
/// Warning: the pass runs over the assembled SQL text and does not skip string literals or
/// comments. A raw fragment such as `where note = 'why?'` consumes a position and shifts every
/// binding after it. Keep literal question marks out of raw SQL, or bind them as values.
///
/// Returns a borrowed `Cow` when the style needs no rewriting.
#[must_use]
pub fn position_bindings(sql: &str, style: PlaceholderStyle) -> Cow<'_, str> {
    if matches!(style, PlaceholderStyle::Question) || !sql.contains(NEUTRAL_PLACEHOLDER) {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0;
    for ch in sql.chars() {
        if ch == NEUTRAL_PLACEHOLDER {
            index += 1;
            out.push_str(&style.token(index));
        } else {
            out.push(ch);
        }
    }
    Cow::Owned(out)
}

/// Count the neutral placeholders [`position_bindings`] would rewrite.
#[must_use]
pub fn count_placeholders(sql: &str) -> usize {
    sql.chars().filter(|ch| *ch == NEUTRAL_PLACEHOLDER).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_colon_style_left_to_right() {
        let res = position_bindings("insert into t values (?, ?, ?)", PlaceholderStyle::Colon);
        assert_eq!(res, "insert into t values (:1, :2, :3)");
    }

    #[test]
    fn positions_dollar_and_atp_styles() {
        let sql = "select * from t where a = ? and b = ?";
        assert_eq!(
            position_bindings(sql, PlaceholderStyle::Dollar),
            "select * from t where a = $1 and b = $2"
        );
        assert_eq!(
            position_bindings(sql, PlaceholderStyle::AtP),
            "select * from t where a = @p1 and b = @p2"
        );
    }

    #[test]
    fn question_style_is_borrowed() {
        let sql = "select * from t where a = ?";
        let res = position_bindings(sql, PlaceholderStyle::Question);
        assert!(matches!(res, Cow::Borrowed(_)));
        assert_eq!(res, sql);
    }

    #[test]
    fn literal_question_marks_are_counted_too() {
        let sql = "select * from t where note = 'why?' and id = ?";
        let res = position_bindings(sql, PlaceholderStyle::Colon);
        assert_eq!(res, "select * from t where note = 'why:1' and id = :2");
        assert_eq!(count_placeholders(sql), 2);
    }
}
