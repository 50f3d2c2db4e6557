use crate::dsl::InterruptSpec;
use crate::error::{CatalogueError, Result};
use std::collections::HashMap;
use tracing::warn;

pub const REF_PREFIX: char = '@';
pub const COMBINE_SEPARATOR: char = '+';

/// 中断表达式 AST
/// `@a+@b+CloseTip` => Combine([Ref(a), Ref(b), Literal(CloseTip)])
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterruptExpr {
    Literal(String),
    Ref(String),
    Combine(Vec<InterruptExpr>),
}

impl InterruptExpr {
    /// Empty terms and bare `@` are dropped. Literal terms are kept in source order.
    pub fn parse(expr: &str) -> Self {
        let terms = expr
            .split(COMBINE_SEPARATOR)
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .filter_map(|term| match term.strip_prefix(REF_PREFIX) {
                Some("") => None,
                Some(name) => Some(InterruptExpr::Ref(name.to_string())),
                None => Some(InterruptExpr::Literal(term.to_string())),
            })
            .collect();
        InterruptExpr::Combine(terms)
    }

    /// 列表形式原样保留 (不解析 `@`，不去重)
    pub fn from_spec(spec: &InterruptSpec) -> Self {
        match spec {
            InterruptSpec::List(items) => InterruptExpr::Combine(
                items.iter().cloned().map(InterruptExpr::Literal).collect(),
            ),
            InterruptSpec::Expr(expr) => InterruptExpr::parse(expr),
        }
    }
}

/// Resolves interrupt specs against the `common_interrupts` table.
///
/// Every table entry is parsed and flattened once on construction, so `resolve` is a
/// pure lookup afterwards. Self-referential entries are rejected with
/// [`CatalogueError::InterruptCycle`]; references to names missing from the table
/// contribute nothing.
#[derive(Debug, Clone, Default)]
pub struct InterruptResolver {
    memo: HashMap<String, Vec<String>>,
}

impl InterruptResolver {
    pub fn new(common: &HashMap<String, InterruptSpec>) -> Result<Self> {
        let exprs: HashMap<&str, InterruptExpr> = common
            .iter()
            .map(|(name, spec)| (name.as_str(), InterruptExpr::from_spec(spec)))
            .collect();

        // sorted so the reported cycle is deterministic
        let mut names: Vec<&str> = exprs.keys().copied().collect();
        names.sort_unstable();

        let mut memo = HashMap::new();
        for name in names {
            let mut stack = Vec::new();
            flatten_ref(&exprs, name, &mut memo, &mut stack)?;
        }

        Ok(Self { memo })
    }

    pub fn resolve(&self, spec: &InterruptSpec) -> Vec<String> {
        let mut out = Vec::new();
        self.resolve_into(&InterruptExpr::from_spec(spec), &mut out);
        out
    }

    pub fn resolve_expr(&self, expr: &InterruptExpr) -> Vec<String> {
        let mut out = Vec::new();
        self.resolve_into(expr, &mut out);
        out
    }

    pub fn common_names(&self) -> impl Iterator<Item = &str> {
        self.memo.keys().map(String::as_str)
    }

    fn resolve_into(&self, expr: &InterruptExpr, out: &mut Vec<String>) {
        match expr {
            InterruptExpr::Literal(id) => out.push(id.clone()),
            InterruptExpr::Ref(name) => match self.memo.get(name) {
                Some(ids) => out.extend(ids.iter().cloned()),
                None => warn!(reference = %name, "Unknown interrupt reference skipped"),
            },
            InterruptExpr::Combine(terms) => {
                for term in terms {
                    self.resolve_into(term, out);
                }
            }
        }
    }
}

fn flatten_ref<'a>(
    exprs: &HashMap<&'a str, InterruptExpr>,
    name: &'a str,
    memo: &mut HashMap<String, Vec<String>>,
    stack: &mut Vec<&'a str>,
) -> Result<Vec<String>> {
    if let Some(ids) = memo.get(name) {
        return Ok(ids.clone());
    }

    if let Some(pos) = stack.iter().position(|n| *n == name) {
        let mut chain: Vec<String> = stack[pos..].iter().map(|s| s.to_string()).collect();
        chain.push(name.to_string());
        return Err(CatalogueError::InterruptCycle(chain));
    }

    let Some(expr) = exprs.get(name) else {
        warn!(reference = %name, "Unknown interrupt reference skipped");
        return Ok(Vec::new());
    };

    stack.push(name);
    let mut out = Vec::new();
    flatten_expr(exprs, expr, memo, stack, &mut out)?;
    stack.pop();

    memo.insert(name.to_string(), out.clone());
    Ok(out)
}

fn flatten_expr<'a>(
    exprs: &HashMap<&'a str, InterruptExpr>,
    expr: &InterruptExpr,
    memo: &mut HashMap<String, Vec<String>>,
    stack: &mut Vec<&'a str>,
    out: &mut Vec<String>,
) -> Result<()> {
    match expr {
        InterruptExpr::Literal(id) => out.push(id.clone()),
        InterruptExpr::Ref(name) => {
            match exprs.get_key_value(name.as_str()) {
                Some((key, _)) => out.extend(flatten_ref(exprs, *key, memo, stack)?),
                None => warn!(reference = %name, "Unknown interrupt reference skipped"),
            }
        }
        InterruptExpr::Combine(terms) => {
            for term in terms {
                flatten_expr(exprs, term, memo, stack, out)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_empty_and_bare_terms() {
        let expr = InterruptExpr::parse(" @a + + @ + CloseTip ");
        assert_eq!(
            expr,
            InterruptExpr::Combine(vec![
                InterruptExpr::Ref("a".to_string()),
                InterruptExpr::Literal("CloseTip".to_string()),
            ])
        );
    }

    #[test]
    fn list_spec_is_kept_verbatim() {
        let resolver = InterruptResolver::default();
        let spec = InterruptSpec::List(vec!["@x".to_string(), "y".to_string(), "y".to_string()]);
        assert_eq!(resolver.resolve(&spec), vec!["@x", "y", "y"]);
    }
}
