//! Ordered rule sets with first-match-wins dispatch.
//!
//! # Usage with pattern! macro
//!
//! ```ignore
//! let mut rules = RuleSet::new("identities");
//! pattern!(rules, Pat::var("x") + Pat::zero("zero") => |_g, x| Some(Build::Existing(x)));
//! pattern!(owned rules, Pat::pow(Pat::var("x"), Pat::one_scalar("one")) => |_g, x| Some(x.into()));
//!
//! if let RewriteResult::Rewritten(new) = rules.rewrite(&mut graph, node) {
//!     graph.replace(node, new)?;
//! }
//! ```

use tracing::{debug, trace};

use crate::graph::{Graph, NodeId};

use super::build::Build;
use super::upat::{BindingStore, Pat, VarIntern};
use super::{RewriteResult, Rewriter};

/// Rewrite function: reads the bindings of a successful match and describes
/// the replacement, or declines with `None`.
pub type RewriteFn = Box<dyn Fn(&BindingStore, &VarIntern, &Graph) -> Option<Build> + Send + Sync>;

struct Rule {
    pat: Pat,
    intern: VarIntern,
    rewrite: RewriteFn,
    /// Skip candidates that do not belong to a subgraph.
    requires_owner: bool,
}

/// Ordered list of `(pattern, rewrite)` rules.
///
/// Rules are tried in insertion order. The first rule whose pattern matches
/// and whose rewrite function accepts wins; its [`Build`] is committed into
/// the candidate's subgraph. A declining rule lets the next one try.
pub struct RuleSet {
    name: String,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), rules: Vec::new() }
    }

    /// Append a rule.
    pub fn add<F>(&mut self, pat: Pat, rewrite: F)
    where
        F: Fn(&BindingStore, &VarIntern, &Graph) -> Option<Build> + Send + Sync + 'static,
    {
        self.push(pat, Box::new(rewrite), false);
    }

    /// Append a rule that only applies to nodes owned by a subgraph.
    pub fn add_owned<F>(&mut self, pat: Pat, rewrite: F)
    where
        F: Fn(&BindingStore, &VarIntern, &Graph) -> Option<Build> + Send + Sync + 'static,
    {
        self.push(pat, Box::new(rewrite), true);
    }

    fn push(&mut self, pat: Pat, rewrite: RewriteFn, requires_owner: bool) {
        let intern = pat.collect_var_names();
        self.rules.push(Rule { pat, intern, rewrite, requires_owner });
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Try every rule against `node` in order.
    ///
    /// The graph is only modified when a rule accepts. Nothing is redirected:
    /// substituting the returned node for `node` is the caller's job.
    ///
    /// # Panics
    ///
    /// If an accepted [`Build`] references a node missing from the graph.
    ///
    /// # Tracing
    ///
    /// Enable debug-level tracing to see pattern matching activity:
    /// ```bash
    /// RUST_LOG=graft_ir::pattern=debug cargo run
    /// ```
    pub fn rewrite(&self, graph: &mut Graph, node: NodeId) -> RewriteResult {
        let owner = graph.owner(node);

        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.requires_owner && owner.is_none() {
                trace!(rule_set = %self.name, pattern_idx = idx, %node, "skipping owned rule for detached node");
                continue;
            }
            trace!(rule_set = %self.name, pattern_idx = idx, %node, "trying pattern");
            let Some(bindings) = rule.pat.match_first(graph, node, &rule.intern) else {
                continue;
            };
            trace!(rule_set = %self.name, pattern_idx = idx, %node, "pattern matched, running rewrite");

            let Some(build) = (rule.rewrite)(&bindings, &rule.intern, graph) else {
                trace!(rule_set = %self.name, pattern_idx = idx, "rewrite declined");
                continue;
            };
            let replacement = match build.materialize(graph, owner) {
                Ok(id) => id,
                Err(err) => panic!("rule {idx} of '{}' built an invalid replacement for {node}: {err}", self.name),
            };
            debug!(rule_set = %self.name, pattern_idx = idx, %node, %replacement, "pattern rewrote node");
            return RewriteResult::Rewritten(replacement);
        }

        RewriteResult::NoMatch
    }
}

impl Rewriter for RuleSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn rewrite(&self, graph: &mut Graph, node: NodeId) -> RewriteResult {
        RuleSet::rewrite(self, graph, node)
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet").field("name", &self.name).field("rules", &self.rules.len()).finish()
    }
}
