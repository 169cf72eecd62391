use crate::sql::SqlValue;

///
/// Statement
///
/// Final query text plus its ordered bound parameters, ready for a store
/// connection. The text never contains caller-supplied values.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    #[must_use]
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

///
/// FragmentBuilder
///
/// Hands out positional `$n` placeholders and accumulates the bound values
/// in matching order. Indices start at 1 and stay dense; fragments produced
/// elsewhere (the ownership scope resolver) are absorbed with their
/// already-assigned indices.
///

#[derive(Debug, Default)]
pub struct FragmentBuilder {
    params: Vec<SqlValue>,
}

impl FragmentBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// The next unassigned positional index.
    #[must_use]
    pub const fn next_index(&self) -> usize {
        self.params.len() + 1
    }

    /// Bind a value and return its `$n` placeholder.
    pub fn bind(&mut self, value: SqlValue) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    /// Absorb parameters produced against `next_index()` by a collaborator.
    ///
    /// The collaborator must have numbered its placeholders starting at the
    /// index this builder reported; absorbing keeps text and values aligned.
    pub fn absorb(&mut self, params: Vec<SqlValue>) {
        self.params.extend(params);
    }

    #[must_use]
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<SqlValue> {
        self.params.clone()
    }

    #[must_use]
    pub fn into_params(self) -> Vec<SqlValue> {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::FragmentBuilder;
    use crate::sql::SqlValue;
    use proptest::prelude::*;

    #[test]
    fn placeholders_are_dense_and_one_based() {
        let mut fb = FragmentBuilder::new();
        assert_eq!(fb.next_index(), 1);

        let a = fb.bind(SqlValue::Int(1));
        let b = fb.bind(SqlValue::Text("x".into()));
        assert_eq!(a, "$1");
        assert_eq!(b, "$2");
        assert_eq!(fb.next_index(), 3);
        assert_eq!(fb.params().len(), 2);
    }

    #[test]
    fn absorb_continues_numbering() {
        let mut fb = FragmentBuilder::new();
        fb.bind(SqlValue::Int(1));

        let start = fb.next_index();
        assert_eq!(start, 2);
        fb.absorb(vec![SqlValue::Int(2), SqlValue::Int(3)]);
        assert_eq!(fb.next_index(), 4);
    }

    proptest! {
        // Placeholder numbering must match parameter positions for any
        // sequence of binds.
        #[test]
        fn placeholder_matches_position(count in 0usize..64) {
            let mut fb = FragmentBuilder::new();
            for i in 0..count {
                #[allow(clippy::cast_possible_wrap)]
                let ph = fb.bind(SqlValue::Int(i as i64));
                prop_assert_eq!(ph, format!("${}", i + 1));
            }
            prop_assert_eq!(fb.params().len(), count);
        }
    }
}
