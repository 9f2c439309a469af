use crate::params::ParameterPoint;

/// Identifier used when a sweep declares no variables.
pub const CONSTANTS_ONLY_IDENTIFIER: &str = "constants";

/// Builds the artifact name of a point from its variable values only:
/// `name(value)` segments joined by `_` in declaration order.
pub fn point_identifier(point: &ParameterPoint<'_>) -> String {
    let segments = point
        .variables()
        .map(|(variable, value)| format!("{}({})", variable.name, variable.display_value(value)))
        .collect::<Vec<_>>();

    if segments.is_empty() {
        CONSTANTS_ONLY_IDENTIFIER.to_string()
    } else {
        segments.join("_")
    }
}
