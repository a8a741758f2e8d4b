use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::{config::Config, metric::DisplayLabel, sheet::Filter};

/// Where one source keeps a metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnRoute {
    pub sheet: String,
    pub column: String,
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRoute {
    pub label: DisplayLabel,
    /// Base metric identifier the label was derived from
    pub metric: String,
    /// Keyed by source name. Plotting order comes from the source list, not this map.
    pub sources: BTreeMap<String, ColumnRoute>,
}

/// Display label -> per source location, in catalog order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RoutingTable {
    routes: Vec<MetricRoute>,
}

impl RoutingTable {
    pub fn get(&self, label: &str) -> Option<&MetricRoute> {
        self.routes.iter().find(|r| r.label.as_str() == label)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetricRoute> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<'a> IntoIterator for &'a RoutingTable {
    type Item = &'a MetricRoute;
    type IntoIter = std::slice::Iter<'a, MetricRoute>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

pub fn build_routing(config: &Config) -> RoutingTable {
    let mut routes: Vec<MetricRoute> = Vec::with_capacity(config.metrics.len());
    for metric in config.metrics.iter() {
        let sources = config
            .sources
            .iter()
            .map(|source| {
                (
                    source.name.clone(),
                    ColumnRoute {
                        sheet: source.sheet.clone(),
                        column: source.column(metric),
                        filters: Vec::new(),
                    },
                )
            })
            .collect();
        let route = MetricRoute {
            label: DisplayLabel::from_metric(metric),
            metric: metric.to_owned(),
            sources,
        };

        if let Some(existing) = routes.iter_mut().find(|r| r.label == route.label) {
            warn!(
                "'{}' and '{}' share the label '{}', keeping '{}'",
                existing.metric, route.metric, route.label, route.metric
            );
            *existing = route;
        } else {
            routes.push(route);
        }
    }
    debug!(
        "Routed {} metrics over {} sources",
        routes.len(),
        config.sources.len()
    );
    RoutingTable { routes }
}
