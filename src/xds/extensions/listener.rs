//! Listener filter chain traversal.
//!
//! Listeners are scoped to an upstream differently depending on the proxy role:
//!
//! - A terminating gateway serves many upstreams from one listener and routes by TLS
//!   server name, so each filter chain is matched on its own SNI.
//! - A connect proxy has one outbound listener per upstream, named
//!   `<envoy id>:<address>:<port>`, so the whole listener is matched on the ID prefix
//!   and then every filter chain is patched.

use envoy_types::pb::envoy::config::listener::v3::{FilterChain, Listener};
use tracing::debug;

use super::{Patched, Patcher};
use crate::errors::ExtensionError;
use crate::xds::extension::{ExtensionConfiguration, ServiceKind};

/// Result of traversing one listener.
#[derive(Debug, Default)]
pub struct ListenerPatch {
    /// Rewritten listener, present only when at least one filter changed
    pub listener: Option<Listener>,
    /// Filter failures; the failing filters keep their original value
    pub errors: Vec<ExtensionError>,
}

/// Patch a listener with the traversal matching the proxy role.
pub fn patch_listener(
    config: &ExtensionConfiguration,
    listener: &Listener,
    patcher: &dyn Patcher,
) -> ListenerPatch {
    match config.kind {
        ServiceKind::TerminatingGateway => {
            patch_terminating_gateway_listener(config, listener, patcher)
        }
        ServiceKind::ConnectProxy => patch_connect_proxy_listener(config, listener, patcher),
        _ => ListenerPatch::default(),
    }
}

/// Patch the filters of every chain whose server name belongs to the upstream.
///
/// Chains without a server name, or with one that belongs to another upstream, are
/// left exactly as they were.
pub fn patch_terminating_gateway_listener(
    config: &ExtensionConfiguration,
    listener: &Listener,
    patcher: &dyn Patcher,
) -> ListenerPatch {
    let mut chains = FilterChainPatcher::new(listener, patcher);

    for (index, chain) in listener.filter_chains.iter().enumerate() {
        let sni = filter_chain_sni(chain);
        if sni.is_empty() || !config.matches_upstream_service_sni(sni) {
            continue;
        }

        debug!(listener = %listener.name, sni, "Patching terminating gateway filter chain");
        chains.patch_chain(index);
    }

    chains.finish()
}

/// Patch every filter of a connect proxy listener that belongs to the upstream.
pub fn patch_connect_proxy_listener(
    config: &ExtensionConfiguration,
    listener: &Listener,
    patcher: &dyn Patcher,
) -> ListenerPatch {
    if listener_envoy_id(&listener.name) != config.envoy_id() {
        return ListenerPatch::default();
    }

    debug!(
        listener = %listener.name,
        filter_chains = listener.filter_chains.len(),
        "Patching connect proxy listener"
    );

    let mut chains = FilterChainPatcher::new(listener, patcher);
    for index in 0..listener.filter_chains.len() {
        chains.patch_chain(index);
    }

    chains.finish()
}

/// The first server name a filter chain matches on, or `""` if it has none.
pub fn filter_chain_sni(chain: &FilterChain) -> &str {
    chain
        .filter_chain_match
        .as_ref()
        .and_then(|chain_match| chain_match.server_names.first())
        .map(String::as_str)
        .unwrap_or_default()
}

/// The envoy ID prefix of a listener name: everything before the first `':'`.
pub fn listener_envoy_id(name: &str) -> &str {
    name.split_once(':').map_or(name, |(envoy_id, _)| envoy_id)
}

/// Applies a patcher to selected filter chains of a listener.
///
/// The listener is only cloned once the first filter changes, so untouched
/// listeners never allocate.
struct FilterChainPatcher<'a> {
    original: &'a Listener,
    patched: Option<Listener>,
    patcher: &'a dyn Patcher,
    errors: Vec<ExtensionError>,
}

impl<'a> FilterChainPatcher<'a> {
    fn new(original: &'a Listener, patcher: &'a dyn Patcher) -> Self {
        Self { original, patched: None, patcher, errors: Vec::new() }
    }

    fn patch_chain(&mut self, index: usize) {
        let original = self.original;
        let chain = &original.filter_chains[index];
        let mut filters = Vec::with_capacity(chain.filters.len());
        let mut changed = false;

        for filter in &chain.filters {
            match self.patcher.patch_filter(filter) {
                Ok(Patched::Changed(new_filter)) => {
                    filters.push(new_filter);
                    changed = true;
                }
                Ok(Patched::Unchanged) => filters.push(filter.clone()),
                Err(source) => {
                    self.errors.push(ExtensionError::ListenerFilter {
                        listener: original.name.clone(),
                        filter: filter.name.clone(),
                        source,
                    });
                    filters.push(filter.clone());
                }
            }
        }

        if changed {
            let listener = self.patched.get_or_insert_with(|| original.clone());
            listener.filter_chains[index].filters = filters;
        }
    }

    fn finish(self) -> ListenerPatch {
        ListenerPatch { listener: self.patched, errors: self.errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envoy_types::pb::envoy::config::listener::v3::FilterChainMatch;

    #[test]
    fn test_listener_envoy_id() {
        assert_eq!(listener_envoy_id("db:127.0.0.1:9191"), "db");
        assert_eq!(listener_envoy_id("db"), "db");
        assert_eq!(listener_envoy_id(":127.0.0.1"), "");
        assert_eq!(listener_envoy_id(""), "");
    }

    #[test]
    fn test_filter_chain_sni() {
        let mut chain = FilterChain::default();
        assert_eq!(filter_chain_sni(&chain), "");

        chain.filter_chain_match = Some(FilterChainMatch::default());
        assert_eq!(filter_chain_sni(&chain), "");

        chain.filter_chain_match = Some(FilterChainMatch {
            server_names: vec!["db.default.dc1".to_string(), "db.alt.dc1".to_string()],
            ..Default::default()
        });
        assert_eq!(filter_chain_sni(&chain), "db.default.dc1");
    }
}
