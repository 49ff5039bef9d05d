//! Template compiler: `{name:type}` path templates to anchored matchers.
//!
//! A template is split on `/` with empty segments discarded, so leading,
//! trailing and doubled slashes never matter. Placeholder segments are
//! replaced by their type's segment pattern; literal segments are copied into
//! the pattern as they are. Incoming paths are split the same way and
//! percent-decoded segment by segment ([`decode_path`]) before they are
//! matched.

use percent_encoding::percent_decode_str;
use regex::Regex;

use super::error::ConfigError;
use super::types::VarType;

/// One placeholder of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathVariable {
    /// 0-based position among the non-empty segments.
    pub index: usize,
    pub kind: VarType,
    pub name: String,
}

/// A template after compilation.
///
/// Compiling the same text twice yields matchers with identical source, which
/// is what the route table uses to merge repeated mounts.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    text: String,
    variables: Vec<PathVariable>,
    matcher: Regex,
}

impl CompiledTemplate {
    /// Compiles `template`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidTemplate`] when a placeholder has no name or a
    /// literal segment is not a valid regular expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use pathrouter::router::{CompiledTemplate, VarType};
    ///
    /// let t = CompiledTemplate::compile("/kng/{kid:str}/details").unwrap();
    /// assert_eq!(t.variables().len(), 1);
    /// assert_eq!(t.variables()[0].index, 1);
    /// assert_eq!(t.variables()[0].kind, VarType::Str);
    /// assert!(t.is_match("kng/abc-1/details"));
    /// ```
    pub fn compile(template: &str) -> Result<Self, ConfigError> {
        let mut variables = Vec::new();
        let mut parts = Vec::new();

        for (index, segment) in segments(template).enumerate() {
            let Some(placeholder) = segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
            else {
                parts.push(segment.to_owned());
                continue;
            };

            // `{name}` without a type tag is a `str` variable.
            let (name, tag) = placeholder.split_once(':').unwrap_or((placeholder, ""));
            if name.is_empty() {
                return Err(ConfigError::InvalidTemplate {
                    template: template.to_owned(),
                    reason: format!("placeholder '{segment}' has no name"),
                });
            }

            let kind = VarType::lookup(tag);
            parts.push(format!("(?:{})", kind.pattern()));
            variables.push(PathVariable {
                index,
                kind,
                name: name.to_owned(),
            });
        }

        let source = format!("^(?:{})$", parts.join("/"));
        let matcher = Regex::new(&source).map_err(|e| ConfigError::InvalidTemplate {
            template: template.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            text: template.to_owned(),
            variables,
            matcher,
        })
    }

    /// The template as it was mounted.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn variables(&self) -> &[PathVariable] {
        &self.variables
    }

    /// Source of the anchored matcher.
    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }

    /// Returns `true` if `normalized` (decoded segments joined by `/`, see
    /// [`decode_path`]) matches in full.
    pub fn is_match(&self, normalized: &str) -> bool {
        self.matcher.is_match(normalized)
    }

    /// Two templates route the same paths exactly when their matcher sources are equal.
    pub fn same_matcher(&self, other: &CompiledTemplate) -> bool {
        self.pattern() == other.pattern()
    }
}

/// Non-empty `/`-delimited segments of a path or template.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Percent-decoded non-empty segments of a request path.
///
/// Each segment is decoded on its own, after splitting, so an encoded `%2F`
/// never introduces a segment boundary. Returns `None` when a segment does
/// not decode to UTF-8 or decodes to text containing `/`; no template can
/// match such a path.
pub fn decode_path(path: &str) -> Option<Vec<String>> {
    segments(path)
        .map(|segment| {
            let decoded = percent_decode_str(segment).decode_utf8().ok()?;
            (!decoded.contains('/')).then(|| decoded.into_owned())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_template_has_no_variables() {
        let t = CompiledTemplate::compile("/kng/list").unwrap();
        assert!(t.variables().is_empty());
        assert_eq!(t.pattern(), "^(?:kng/list)$");
        assert_eq!(t.text(), "/kng/list");
    }

    #[test]
    fn slashes_are_insignificant() {
        let a = CompiledTemplate::compile("/kng/list").unwrap();
        let b = CompiledTemplate::compile("kng//list/").unwrap();
        assert!(a.same_matcher(&b));
    }

    #[test]
    fn variable_positions_and_types() {
        let t = CompiledTemplate::compile("/users/{id:int64}/posts/{slug:str}/{ref:uuid4}").unwrap();
        let vars = t.variables();
        assert_eq!(vars.len(), 3);
        assert_eq!(
            vars[0],
            PathVariable {
                index: 1,
                kind: VarType::Int64,
                name: "id".into()
            }
        );
        assert_eq!(vars[1].index, 3);
        assert_eq!(vars[1].kind, VarType::Str);
        assert_eq!(vars[2].index, 4);
        assert_eq!(vars[2].kind, VarType::Uuid4);
    }

    #[test]
    fn unknown_type_tag_compiles_as_str() {
        let a = CompiledTemplate::compile("/a/{x:date}").unwrap();
        let b = CompiledTemplate::compile("/a/{x:str}").unwrap();
        assert_eq!(a.variables()[0].kind, VarType::Str);
        assert!(a.same_matcher(&b));
    }

    #[test]
    fn untyped_placeholder_is_str() {
        let t = CompiledTemplate::compile("/a/{x}").unwrap();
        assert_eq!(t.variables()[0].kind, VarType::Str);
        assert_eq!(t.variables()[0].name, "x");
    }

    #[test]
    fn nameless_placeholder_is_rejected() {
        let err = CompiledTemplate::compile("/a/{:int64}").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTemplate { .. }));
    }

    #[test]
    fn broken_literal_is_rejected() {
        let err = CompiledTemplate::compile("/a(/b").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTemplate { ref template, .. } if template == "/a(/b"));
    }

    #[test]
    fn variable_names_do_not_affect_matcher() {
        let a = CompiledTemplate::compile("/a/{x:int64}").unwrap();
        let b = CompiledTemplate::compile("/a/{y:int64}").unwrap();
        let c = CompiledTemplate::compile("/a/{y:str}").unwrap();
        assert!(a.same_matcher(&b));
        assert!(!a.same_matcher(&c));
    }

    #[test]
    fn matcher_is_anchored_at_both_ends() {
        let t = CompiledTemplate::compile("/items/{n:int64}").unwrap();
        assert!(t.is_match("items/42"));
        assert!(!t.is_match("items/42/extra"));
        assert!(!t.is_match("prefix/items/42"));
        assert!(!t.is_match("items/abc"));
    }

    #[test]
    fn alternation_in_float_pattern_stays_inside_its_segment() {
        let t = CompiledTemplate::compile("/a/{x:float64}/b").unwrap();
        assert!(t.is_match("a/1.5/b"));
        assert!(!t.is_match("a/1.5"));
        assert!(!t.is_match("a/1.5/c"));
    }

    #[test]
    fn root_template_matches_empty_path() {
        let t = CompiledTemplate::compile("/").unwrap();
        assert!(t.is_match(&decode_path("/").unwrap().join("/")));
        assert!(!t.is_match("a"));
    }

    #[test]
    fn decode_path_drops_empty_segments() {
        assert_eq!(decode_path("/a//b/").unwrap(), vec!["a", "b"]);
        assert_eq!(decode_path("a/b").unwrap(), vec!["a", "b"]);
        assert!(decode_path("///").unwrap().is_empty());
    }

    #[test]
    fn decode_path_decodes_each_segment() {
        assert_eq!(
            decode_path("/kng/abc%2D1/details").unwrap(),
            vec!["kng", "abc-1", "details"]
        );
        assert_eq!(decode_path("/items/%34%32").unwrap(), vec!["items", "42"]);
        assert_eq!(decode_path("/a%20b").unwrap(), vec!["a b"]);
    }

    #[test]
    fn encoded_slash_or_bad_utf8_is_rejected() {
        assert_eq!(decode_path("/a%2Fb"), None);
        assert_eq!(decode_path("/a%2fb"), None);
        assert_eq!(decode_path("/%FF"), None);
    }
}
