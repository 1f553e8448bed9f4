use std::fmt;

use regex::Regex;

use crate::error::{AbookError, Result};
use crate::model::{AddressbookData, Record};

/// Separators accepted between field name and pattern, tried in order.
const SEPARATORS: [char; 2] = [':', '='];

/// Field-name + regex predicate, e.g. `name:^bob` or `email=example\.com`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Lowercased field name.
    pub key: String,
    pub val: String,
    pub ignore_case: bool,
}

impl Query {
    pub fn parse(input: &str, ignore_case: bool) -> Result<Self> {
        for sep in SEPARATORS {
            if let Some((key, val)) = input.split_once(sep) {
                return Ok(Self {
                    key: key.to_lowercase(),
                    val: val.to_string(),
                    ignore_case,
                });
            }
        }
        Err(AbookError::InvalidQuery(input.to_string()))
    }

    fn matcher(&self) -> Result<Regex> {
        let pattern = if self.ignore_case {
            self.val.to_lowercase()
        } else {
            self.val.clone()
        };
        Ok(Regex::new(&pattern)?)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.val)
    }
}

impl AddressbookData {
    /// First record, in store order, with a field named `query.key`
    /// (ignoring case of the name) whose value contains a match for the
    /// pattern. With `ignore_case` both pattern and value are lowercased
    /// before matching, rather than compiling a case-insensitive regex.
    pub fn find(&self, query: &Query) -> Result<(u32, &Record)> {
        let matcher = query.matcher()?;

        for (id, record) in self.items.iter() {
            for (field, value) in record {
                if field.to_lowercase() != query.key {
                    continue;
                }
                let hit = if query.ignore_case {
                    matcher.is_match(&value.to_lowercase())
                } else {
                    matcher.is_match(value)
                };
                if hit {
                    log::debug!("query {} matched record {} via `{}`", query, id, field);
                    return Ok((id, record));
                }
            }
        }

        Err(AbookError::NotFound(query.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::record;

    fn book(records: &[&[(&str, &str)]]) -> AddressbookData {
        let mut data = AddressbookData::default();
        for (id, fields) in records.iter().enumerate() {
            data.items.insert(id as u32, record(fields));
        }
        data
    }

    #[test]
    fn test_parse_splits_on_first_separator() {
        let q = Query::parse("Name:bob:builder", true).unwrap();
        assert_eq!(q.key, "name");
        assert_eq!(q.val, "bob:builder");
        assert!(q.ignore_case);

        let q = Query::parse("EMAIL=a=b", false).unwrap();
        assert_eq!(q.key, "email");
        assert_eq!(q.val, "a=b");
    }

    #[test]
    fn test_parse_prefers_colon() {
        let q = Query::parse("url=http://x", true).unwrap();
        assert_eq!(q.key, "url=http");
        assert_eq!(q.val, "//x");
    }

    #[test]
    fn test_parse_without_separator() {
        let err = Query::parse("bob", true).unwrap_err();
        assert!(matches!(err, AbookError::InvalidQuery(ref s) if s == "bob"));
    }

    #[test]
    fn test_ignore_case_substring_search() {
        let query = Query::parse("Name:bob", true).unwrap();

        let data = book(&[&[("name", "Alice")], &[("name", "BOBBY")], &[("name", "Bob")]]);
        let (id, found) = data.find(&query).unwrap();
        assert_eq!(id, 1);
        assert_eq!(found["name"], "BOBBY");

        let data = book(&[&[("Name", "Bob")]]);
        assert_eq!(data.find(&query).unwrap().0, 0);
    }

    #[test]
    fn test_case_sensitive_anchored_pattern() {
        let data = book(&[&[("Name", "Bob")]]);

        let strict = Query::parse("name:^bob$", false).unwrap();
        assert!(matches!(data.find(&strict), Err(AbookError::NotFound(_))));

        let loose = Query::parse("name:^bob$", true).unwrap();
        assert_eq!(loose.to_string(), "name:^bob$");
        assert!(data.find(&loose).is_ok());
    }

    #[test]
    fn test_ignore_case_lowercases_pattern_classes() {
        // `[A-Z]` becomes `[a-z]` once lowercased, so it matches lowercase text
        let data = book(&[&[("nick", "bob")]]);
        let query = Query::parse("nick:^[A-Z]", true).unwrap();
        assert!(data.find(&query).is_ok());

        let query = Query::parse("nick:^[A-Z]", false).unwrap();
        assert!(data.find(&query).is_err());
    }

    #[test]
    fn test_first_match_in_store_order() {
        let mut data = AddressbookData::default();
        data.items.insert(9, record(&[("email", "one@example.com")]));
        data.items.insert(1, record(&[("email", "two@example.com")]));

        let query = Query::parse("email:example", true).unwrap();
        assert_eq!(data.find(&query).unwrap().0, 9);
    }

    #[test]
    fn test_only_named_field_is_searched() {
        let data = book(&[&[("name", "Carol"), ("notes", "knows bob")]]);
        let query = Query::parse("name:bob", true).unwrap();

        let err = data.find(&query).unwrap_err();
        assert_eq!(err.to_string(), "no record matches `name:bob`");
    }

    #[test]
    fn test_invalid_pattern() {
        let data = book(&[&[("name", "x")]]);
        let query = Query::parse("name:(", true).unwrap();
        assert!(matches!(data.find(&query), Err(AbookError::Pattern(_))));
    }
}
