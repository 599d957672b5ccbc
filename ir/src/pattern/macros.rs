//! Declarative helper for registering rules.
//!
//! ```ignore
//! pattern!(rules, Pat::var("x") * Pat::one("one") => |_g, x| Some(Build::Existing(x)));
//! ```
//!
//! Every identifier after the graph parameter is looked up as a placeholder of
//! the same name; a missing binding makes the rule decline.

/// Register a rule in a [`RuleSet`](crate::pattern::RuleSet).
///
/// Prefix the rule set with `owned` to restrict the rule to nodes that belong
/// to a subgraph.
#[macro_export]
macro_rules! pattern {
    (owned $rules:expr, $pat:expr => |$graph:ident $(, $var:ident)*| $body:expr) => {
        $rules.add_owned($pat, move |bindings, intern, $graph| {
            $( let $var = intern.lookup(bindings, stringify!($var))?; )*
            $body
        })
    };
    ($rules:expr, $pat:expr => |$graph:ident $(, $var:ident)*| $body:expr) => {
        $rules.add($pat, move |bindings, intern, $graph| {
            $( let $var = intern.lookup(bindings, stringify!($var))?; )*
            $body
        })
    };
}
