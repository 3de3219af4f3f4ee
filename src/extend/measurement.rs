//! Environmental measurement clusters.

use crate::converter::{
    AccessMode, CustomConverter, Expose, FieldRole, NumericArgs, PartialState, ReportingPolicy,
    Scale, number,
};
use crate::definition::Extend;
use crate::error::ConverterError;
use crate::zcl::{Cluster, InboundEvent, WireAddress, attr};

fn measured_value(
    name: &str,
    cluster: Cluster,
    unit: &str,
    description: &str,
    reporting: ReportingPolicy,
) -> Result<Extend, ConverterError> {
    let mut args = NumericArgs::new(name, cluster, attr::MEASURED_VALUE);
    args.unit = Some(unit.to_string());
    args.description = description.to_string();
    args.scale = Scale::Divide(100.0);
    args.precision = Some(2);
    args.reporting = reporting;
    super::numeric(args)
}

/// Temperature in °C from msTemperatureMeasurement (0.01 °C steps).
pub fn temperature(reporting: ReportingPolicy) -> Result<Extend, ConverterError> {
    measured_value(
        "temperature",
        Cluster::MsTemperatureMeasurement,
        "°C",
        "Measured temperature value",
        reporting,
    )
}

/// Relative humidity in % from msRelativeHumidity (0.01 % steps).
pub fn humidity(reporting: ReportingPolicy) -> Result<Extend, ConverterError> {
    measured_value(
        "humidity",
        Cluster::MsRelativeHumidity,
        "%",
        "Measured relative humidity",
        reporting,
    )
}

/// Illuminance in lux. The wire value is 10000·log10(lux) + 1.
fn decode_illuminance(event: &InboundEvent) -> Result<PartialState, ConverterError> {
    let raw = event.require("illuminance", attr::MEASURED_VALUE)?.as_f64();
    let lux = if raw <= 0.0 {
        0.0
    } else {
        10f64.powf((raw - 1.0) / 10000.0).round()
    };
    let mut state = PartialState::new();
    state.insert("illuminance".into(), number(lux));
    Ok(state)
}

pub fn illuminance(reporting: ReportingPolicy) -> Extend {
    let address = WireAddress::new(Cluster::MsIlluminanceMeasurement, attr::MEASURED_VALUE);
    let mut converter = CustomConverter::new("illuminance")
        .field(address, FieldRole::Trigger)
        .decode(decode_illuminance)
        .expose(
            Expose::numeric("illuminance", AccessMode::ReadReport)
                .with_unit("lx")
                .with_description("Measured illuminance"),
        );
    if reporting == ReportingPolicy::Default {
        converter = converter.report(address, Scale::None);
    }
    converter.build().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::DefinitionBuilder;
    use crate::zcl::WireValue;
    use serde_json::json;

    #[test]
    fn test_temperature_and_humidity_are_scaled() {
        let definition = DefinitionBuilder::new("TH")
            .extend(humidity(ReportingPolicy::Disabled).unwrap())
            .extend(temperature(ReportingPolicy::Disabled).unwrap())
            .build()
            .unwrap();

        let temperature = InboundEvent::report(
            Cluster::MsTemperatureMeasurement,
            [(attr::MEASURED_VALUE, WireValue::Int(2350))],
        );
        assert_eq!(definition.decode(&temperature).get("temperature"), Some(&json!(23.5)));

        let humidity = InboundEvent::report(
            Cluster::MsRelativeHumidity,
            [(attr::MEASURED_VALUE, WireValue::Int(4512))],
        );
        assert_eq!(definition.decode(&humidity).get("humidity"), Some(&json!(45.12)));
    }

    #[test]
    fn test_illuminance_is_logarithmic() {
        let definition = DefinitionBuilder::new("L")
            .extend(illuminance(ReportingPolicy::Disabled))
            .build()
            .unwrap();
        let decode = |raw: i64| {
            let event = InboundEvent::report(
                Cluster::MsIlluminanceMeasurement,
                [(attr::MEASURED_VALUE, WireValue::Int(raw))],
            );
            definition.decode(&event).get("illuminance").cloned()
        };
        assert_eq!(decode(0), Some(json!(0)));
        assert_eq!(decode(1), Some(json!(1)));
        assert_eq!(decode(20001), Some(json!(100)));
    }

    #[test]
    fn test_reporting_policy_controls_subscription() {
        assert!(illuminance(ReportingPolicy::Disabled).capabilities()[0]
            .report_targets()
            .is_empty());
        assert_eq!(
            temperature(ReportingPolicy::Default).unwrap().capabilities()[0]
                .report_targets()
                .len(),
            1
        );
    }
}
