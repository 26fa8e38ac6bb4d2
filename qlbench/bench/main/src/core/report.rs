//! Console report lines.

use crate::api::types::{ExperimentConfig, TrialStats, Variant};

/// `"<dtype>. Sizes: [<out>, <in>]"`, the weight shape as stored.
pub fn header_line(config: &ExperimentConfig) -> String {
    format!(
        "{}. Sizes: [{}, {}]",
        config.dtype, config.out_features, config.in_features
    )
}

/// `"<Variant> time: <mean> +- <ci> ms"`, both to three decimals.
pub fn time_line(variant: Variant, stats: &TrialStats) -> String {
    format!("{} time: {:.3} +- {:.3} ms", variant.label(), stats.mean, stats.ci)
}
