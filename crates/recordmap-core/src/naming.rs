//! Name resolver: which JSON key a field is written under and read from.

use heck::ToSnakeCase;
use serde_json::Map;
use std::borrow::Cow;
use std::collections::HashMap;

use crate::Json;
use crate::options::PropertyMatchingRule;
use crate::registry::FieldMapping;

/// snake_case with digit runs as words of their own, so `addressLine1`
/// becomes `address_line_1`.
pub fn snake_case(name: &str) -> String {
    let mut split = String::with_capacity(name.len() + 4);
    let mut previous: Option<char> = None;
    for c in name.chars() {
        if let Some(p) = previous {
            if (p.is_alphabetic() && c.is_ascii_digit()) || (p.is_ascii_digit() && c.is_alphabetic()) {
                split.push('_');
            }
        }
        split.push(c);
        previous = Some(c);
    }
    split.to_snake_case()
}

fn transform(name: &str, snake_case: bool) -> Cow<'_, str> {
    if snake_case {
        Cow::Owned(self::snake_case(name))
    } else {
        Cow::Borrowed(name)
    }
}

/// Key `mapping` is emitted under.
///
/// With `auto_snake_case` on and no explicit JSON name declared, the field
/// name is converted to snake_case; otherwise the authoritative JSON name is
/// used verbatim.
pub fn json_key(mapping: &FieldMapping, auto_snake_case: bool) -> Cow<'_, str> {
    transform(
        mapping.primary_json_name(),
        auto_snake_case && !mapping.is_name_given(),
    )
}

/// Keys tried in order when reading `mapping`, authoritative first.
pub fn candidate_keys(mapping: &FieldMapping, auto_snake_case: bool) -> Vec<Cow<'_, str>> {
    let snake_case = auto_snake_case && !mapping.is_name_given();
    mapping
        .json_names()
        .iter()
        .map(|name| transform(name, snake_case))
        .collect()
}

/// Outcome of looking a key up in a JSON object.
#[derive(Debug, PartialEq)]
pub enum Lookup<'j> {
    Found(&'j Json),
    Missing,
    /// Several keys match case-insensitively
    Ambiguous(Vec<String>),
}

/// Key lookup over one JSON object under a matching rule.
///
/// Case-insensitive matching folds every key once, up front.
pub struct KeyIndex<'j> {
    object: &'j Map<String, Json>,
    folded: Option<HashMap<String, Vec<(&'j str, &'j Json)>>>,
}

impl<'j> KeyIndex<'j> {
    pub fn new(object: &'j Map<String, Json>, rule: PropertyMatchingRule) -> Self {
        let folded = match rule {
            PropertyMatchingRule::CaseStrict => None,
            PropertyMatchingRule::CaseInsensitive => {
                let mut folded: HashMap<String, Vec<(&'j str, &'j Json)>> = HashMap::with_capacity(object.len());
                for (key, value) in object {
                    folded.entry(key.to_lowercase()).or_default().push((key.as_str(), value));
                }
                Some(folded)
            }
        };
        KeyIndex { object, folded }
    }

    pub fn lookup(&self, key: &str) -> Lookup<'j> {
        let Some(folded) = &self.folded else {
            return self.object.get(key).map_or(Lookup::Missing, Lookup::Found);
        };
        match folded.get(&key.to_lowercase()).map(Vec::as_slice) {
            None | Some([]) => Lookup::Missing,
            Some([(_, value)]) => Lookup::Found(*value),
            // Entries keep document order
            Some(matches) => Lookup::Ambiguous(matches.iter().map(|(key, _)| key.to_string()).collect()),
        }
    }
}
