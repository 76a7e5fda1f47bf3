//! Rulebase — line-oriented reader that grows the parse graph from rule
//! samples.
//!
//! Recognized lines:
//!
//! ```text
//! # comment
//! version=2
//! type=@endpoint:%addr:ipv4%:%port:number%
//! rule=auth,ssh:login from %ip:ipv4%
//! annotate=auth:+class="security"
//! ```
//!
//! Inside a sample, `%name:parser%` or `%name:parser:extra%` installs a
//! field edge (`@type` as the parser references a user-defined type,
//! `%%` is a literal percent); every other character becomes a
//! one-character literal edge so shared prefixes merge.

use serde_json::Value;
use tracing::debug;

use crate::annot::RuleAnnotations;
use crate::context::Context;
use crate::error::BuildError;
use crate::parsers;
use crate::pdag::NodeId;

/// Install a whole rulebase into `ctx`. Stops at the first malformed line;
/// everything before it stays installed. When `annotate=` lines are present
/// and the context has no annotator yet, a [`RuleAnnotations`] table built
/// from them is installed.
pub fn load(ctx: &mut Context, text: &str) -> Result<(), BuildError> {
    let mut annotations = RuleAnnotations::new();
    let mut nrules = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(version) = line.strip_prefix("version=") {
            debug!(version, "rulebase version header");
        } else if let Some(rest) = line.strip_prefix("rule=") {
            install_rule(ctx, rest, lineno)?;
            nrules += 1;
        } else if let Some(rest) = line.strip_prefix("type=") {
            install_type(ctx, rest, lineno)?;
        } else if let Some(rest) = line.strip_prefix("annotate=") {
            install_annotation(&mut annotations, rest, lineno)?;
        } else {
            return Err(BuildError::BadLine {
                line: lineno,
                reason: "expected rule=, type=, annotate= or version=".to_string(),
            });
        }
    }

    debug!(rules = nrules, types = ctx.types.len(), "rulebase loaded");
    if !annotations.is_empty() && !ctx.has_annotator() {
        ctx.set_annotator(Box::new(annotations));
    }
    Ok(())
}

fn install_rule(ctx: &mut Context, rest: &str, lineno: usize) -> Result<(), BuildError> {
    let Some((tags, sample)) = rest.split_once(':') else {
        return Err(BuildError::BadLine {
            line: lineno,
            reason: "rule= takes 'tags:sample'".to_string(),
        });
    };
    let mut at = ctx.root();
    install_sample(ctx, &mut at, sample, lineno)?;
    ctx.set_terminal(at);
    ctx.extend_tags(at, tags.split(',').map(str::trim).filter(|t| !t.is_empty()));
    Ok(())
}

fn install_type(ctx: &mut Context, rest: &str, lineno: usize) -> Result<(), BuildError> {
    let Some((name, sample)) = rest.split_once(':') else {
        return Err(BuildError::BadLine {
            line: lineno,
            reason: "type= takes '@name:sample'".to_string(),
        });
    };
    let Some(name) = name.strip_prefix('@') else {
        return Err(BuildError::BadLine {
            line: lineno,
            reason: format!("type name must start with '@', got '{name}'"),
        });
    };
    let ty = ctx.define_type(name);
    let mut at = ctx.type_root(ty);
    install_sample(ctx, &mut at, sample, lineno)?;
    ctx.set_terminal(at);
    Ok(())
}

/// Walk one sample, appending edges from `*at` and leaving `*at` on the
/// node the sample ends at.
fn install_sample(ctx: &mut Context, at: &mut NodeId, sample: &str, lineno: usize) -> Result<(), BuildError> {
    let mut rest = sample;
    while let Some(c) = rest.chars().next() {
        if c != '%' {
            let spec = ctx.new_literal_edge(c);
            ctx.add_parser(at, spec);
            rest = &rest[c.len_utf8()..];
            continue;
        }
        if let Some(after) = rest.strip_prefix("%%") {
            let spec = ctx.new_literal_edge('%');
            ctx.add_parser(at, spec);
            rest = after;
            continue;
        }
        let Some(end) = rest[1..].find('%') else {
            return Err(BuildError::BadSample {
                line: lineno,
                reason: "unterminated field descriptor".to_string(),
            });
        };
        install_field(ctx, at, &rest[1..1 + end], lineno)?;
        rest = &rest[end + 2..];
    }
    Ok(())
}

/// One `name:parser[:extra]` descriptor.
fn install_field(ctx: &mut Context, at: &mut NodeId, descriptor: &str, lineno: usize) -> Result<(), BuildError> {
    let mut parts = descriptor.splitn(3, ':');
    let (name, parser) = match (parts.next(), parts.next()) {
        (Some(name), Some(parser)) if !name.is_empty() && !parser.is_empty() => (name, parser),
        _ => {
            return Err(BuildError::BadSample {
                line: lineno,
                reason: format!("field descriptor needs 'name:parser', got '{descriptor}'"),
            });
        }
    };
    let extra = parts.next();

    if let Some(type_name) = parser.strip_prefix('@') {
        let ty = ctx.find_type(type_name).ok_or_else(|| BuildError::UnknownType {
            name: type_name.to_string(),
            line: lineno,
        })?;
        let spec = ctx.new_custom_edge(name, ty);
        ctx.add_parser(at, spec);
        return Ok(());
    }

    let id = parsers::id_of(parser).ok_or_else(|| BuildError::UnknownParser {
        name: parser.to_string(),
        line: lineno,
    })?;
    let spec = ctx.new_edge(name, id, extra, None)?;
    ctx.add_parser(at, spec);
    Ok(())
}

fn install_annotation(annotations: &mut RuleAnnotations, rest: &str, lineno: usize) -> Result<(), BuildError> {
    let Some((tag, op)) = rest.split_once(':') else {
        return Err(BuildError::BadLine {
            line: lineno,
            reason: "annotate= takes 'tag:+field=\"value\"'".to_string(),
        });
    };
    let Some(op) = op.strip_prefix('+') else {
        return Err(BuildError::BadLine {
            line: lineno,
            reason: "only '+field=\"value\"' operations are supported".to_string(),
        });
    };
    let Some((field, value)) = op.split_once('=') else {
        return Err(BuildError::BadLine {
            line: lineno,
            reason: "annotation operation needs 'field=\"value\"'".to_string(),
        });
    };
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or_else(|| BuildError::BadLine {
            line: lineno,
            reason: "annotation value must be double-quoted".to_string(),
        })?;
    annotations.add(tag, field, Value::String(value.to_string()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn build(text: &str) -> Context {
        let mut ctx = Context::new();
        load(&mut ctx, text).unwrap();
        ctx.optimize();
        ctx
    }

    #[test]
    fn test_comments_and_blanks_are_skipped() {
        let ctx = build("# a comment\n\nversion=2\nrule=:ok\n");
        let mut record = Map::new();
        assert!(ctx.normalize("ok", &mut record).is_ok());
    }

    #[test]
    fn test_rule_with_fields_and_tags() {
        let ctx = build("rule=auth:login from %ip:ipv4%\n");
        let mut record = Map::new();
        ctx.normalize("login from 10.0.0.1", &mut record).unwrap();
        assert_eq!(record.get("ip"), Some(&json!("10.0.0.1")));
        assert_eq!(record.get(crate::EVENT_TAGS_KEY), Some(&json!(["auth"])));
    }

    #[test]
    fn test_field_with_extra_data() {
        let ctx = build("rule=:%user:char-to:=%=%id:number%\n");
        let mut record = Map::new();
        ctx.normalize("bob=42", &mut record).unwrap();
        assert_eq!(record.get("user"), Some(&json!("bob")));
        assert_eq!(record.get("id"), Some(&json!(42)));
    }

    #[test]
    fn test_percent_escape() {
        let ctx = build("rule=:cpu at %pct:number%%%\n");
        let mut record = Map::new();
        ctx.normalize("cpu at 93%", &mut record).unwrap();
        assert_eq!(record.get("pct"), Some(&json!(93)));
    }

    #[test]
    fn test_type_definition_and_reference() {
        let text = "type=@endpoint:%addr:ipv4%:%port:number%\n\
                    rule=:conn %peer:@endpoint% up\n";
        let ctx = build(text);
        let mut record = Map::new();
        ctx.normalize("conn 10.0.0.1:443 up", &mut record).unwrap();
        assert_eq!(record.get("peer"), Some(&json!({"addr": "10.0.0.1", "port": 443})));
    }

    #[test]
    fn test_unknown_parser_is_reported_with_line() {
        let mut ctx = Context::new();
        let err = load(&mut ctx, "# leading comment\nrule=:%f:no-such%\n").unwrap_err();
        match err {
            BuildError::UnknownParser { name, line } => {
                assert_eq!(name, "no-such");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_type_is_reported() {
        let mut ctx = Context::new();
        let err = load(&mut ctx, "rule=:%f:@missing%\n").unwrap_err();
        assert!(matches!(err, BuildError::UnknownType { .. }));
    }

    #[test]
    fn test_unterminated_descriptor() {
        let mut ctx = Context::new();
        let err = load(&mut ctx, "rule=:broken %field\n").unwrap_err();
        assert!(matches!(err, BuildError::BadSample { line: 1, .. }));
    }

    #[test]
    fn test_garbage_line_rejected() {
        let mut ctx = Context::new();
        assert!(matches!(
            load(&mut ctx, "frobnicate\n"),
            Err(BuildError::BadLine { line: 1, .. })
        ));
    }

    #[test]
    fn test_annotate_lines_install_annotator() {
        let text = "rule=auth:login %u:word%\n\
                    annotate=auth:+class=\"security\"\n";
        let ctx = build(text);
        let mut record = Map::new();
        ctx.normalize("login bob", &mut record).unwrap();
        assert_eq!(record.get("class"), Some(&json!("security")));
    }

    #[test]
    fn test_same_terminal_unions_tags() {
        let ctx = build("rule=auth:x\nrule=ssh:x\n");
        let mut record = Map::new();
        ctx.normalize("x", &mut record).unwrap();
        assert_eq!(record.get(crate::EVENT_TAGS_KEY), Some(&json!(["auth", "ssh"])));
    }
}
