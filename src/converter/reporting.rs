//! Report-configuration policy.
//!
//! Which interval and reportable change to request is a property of the
//! device class, not of the capability. The composition engine asks a
//! [`ReportingDefaults`] implementation for each report target.

use super::capability::ReportTarget;
use crate::zcl::WireOperation;
use serde::{Deserialize, Serialize};

/// Report parameters, reportable change in application units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub min_interval: u16,
    pub max_interval: u16,
    pub reportable_change: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            min_interval: 10,
            max_interval: 3600,
            reportable_change: 1.0,
        }
    }
}

/// Device-class reporting policy.
pub trait ReportingDefaults: Send + Sync {
    /// Parameters for `target`, or `None` to skip its subscription.
    fn report_config(&self, target: &ReportTarget) -> Option<ReportConfig>;
}

/// Same parameters for every target.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StaticReporting(pub ReportConfig);

impl ReportingDefaults for StaticReporting {
    fn report_config(&self, _target: &ReportTarget) -> Option<ReportConfig> {
        Some(self.0)
    }
}

/// Build the configure-reporting operation for `target`.
///
/// The reportable change is converted to wire units through the target's
/// scale.
pub fn configure_operation(target: &ReportTarget, config: ReportConfig) -> WireOperation {
    WireOperation::ConfigureReporting {
        address: target.address,
        min_interval: config.min_interval,
        max_interval: config.max_interval,
        reportable_change: target.scale.to_wire(config.reportable_change),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::Scale;
    use crate::zcl::{Cluster, WireAddress, attr};

    #[test]
    fn test_reportable_change_is_scaled_to_wire_units() {
        let target = ReportTarget {
            address: WireAddress::new(Cluster::MsTemperatureMeasurement, attr::MEASURED_VALUE),
            scale: Scale::Divide(100.0),
        };
        let config = StaticReporting::default().report_config(&target).unwrap();
        assert_eq!(
            configure_operation(&target, config),
            WireOperation::ConfigureReporting {
                address: target.address,
                min_interval: 10,
                max_interval: 3600,
                reportable_change: 100.0,
            }
        );
    }

    #[test]
    fn test_fractional_reportable_change_lands_on_whole_wire_units() {
        let target = ReportTarget {
            address: WireAddress::new(Cluster::MsRelativeHumidity, attr::MEASURED_VALUE),
            scale: Scale::Divide(100.0),
        };
        for (change, wire) in [(0.1, 10.0), (0.29, 29.0), (1.15, 115.0)] {
            let config = ReportConfig {
                reportable_change: change,
                ..ReportConfig::default()
            };
            let WireOperation::ConfigureReporting {
                reportable_change, ..
            } = configure_operation(&target, config)
            else {
                panic!("expected a configure-reporting operation");
            };
            assert_eq!(reportable_change, wire);
        }
    }
}
