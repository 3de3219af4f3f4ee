//! PushOk Hardware devices.

use crate::converter::descriptor::round_to;
use crate::converter::{
    AccessMode, BinaryArgs, BinaryValue, CustomConverter, EnumLookupArgs, Expose, FieldRole,
    NumericArgs, PartialState, ReportingPolicy, number,
};
use crate::definition::{DefinitionBuilder, DeviceDefinition, Extend};
use crate::error::ConverterError;
use crate::extend::{
    self, BatteryArgs, IasZoneArgs, IasZoneAttribute, IasZoneType, IdentifyArgs, OnOffArgs,
};
use crate::zcl::{Cluster, InboundEvent, WireAddress, attr};

const VENDOR: &str = "PushOk Hardware";

/// Actual valve position reported on genMultistateInput.
pub fn valve_status() -> Result<Extend, ConverterError> {
    let mut args = EnumLookupArgs::new(
        "status",
        Cluster::GenMultistateInput,
        attr::PRESENT_VALUE,
        [("OFF", 0), ("ON", 1), ("MOVING", 2), ("STUCK", 3)],
    );
    args.description = "Actual valve status".to_string();
    args.reporting = ReportingPolicy::Disabled;
    extend::enum_lookup(args)
}

/// Motor timeout in seconds, 0..=60.
pub fn stall_time() -> Result<Extend, ConverterError> {
    let mut args = NumericArgs::new("stall_time", Cluster::GenMultistateValue, attr::PRESENT_VALUE);
    args.description = "Timeout for state transition".to_string();
    args.unit = Some("s".to_string());
    args.access = AccessMode::ReadWrite;
    args.value_min = Some(0.0);
    args.value_max = Some(60.0);
    args.value_step = Some(1.0);
    args.reporting = ReportingPolicy::Disabled;
    extend::numeric(args)
}

fn decode_extended_temperature(event: &InboundEvent) -> Result<PartialState, ConverterError> {
    let base = event.require("temperature", attr::MEASURED_VALUE)?.as_f64() / 100.0;
    let extra = event
        .value(attr::TEMPERATURE_EXTENDED_PRECISION)
        .map_or(0.0, |v| v.as_f64() / 10.0);
    let mut state = PartialState::new();
    state.insert("temperature".into(), number(round_to(base + extra, 2)));
    Ok(state)
}

/// Probe temperature with a vendor attribute adding 0.1 °C precision.
pub fn extended_temperature() -> Extend {
    CustomConverter::new("temperature")
        .field(
            WireAddress::new(Cluster::MsTemperatureMeasurement, attr::MEASURED_VALUE),
            FieldRole::Trigger,
        )
        .field(
            WireAddress::new(
                Cluster::MsTemperatureMeasurement,
                attr::TEMPERATURE_EXTENDED_PRECISION,
            ),
            FieldRole::Optional,
        )
        .decode(decode_extended_temperature)
        .expose(
            Expose::numeric("temperature", AccessMode::ReadReport)
                .with_unit("°C")
                .with_description("Measured temperature value"),
        )
        .build()
        .into()
}

fn battery(low_status: bool) -> Extend {
    extend::battery(BatteryArgs {
        percentage: true,
        voltage: true,
        low_status,
        percentage_reporting: false,
        voltage_reporting: false,
    })
}

fn valve_on_off() -> Result<Extend, ConverterError> {
    extend::on_off(OnOffArgs {
        power_on_behavior: false,
        configure_reporting: false,
    })
}

fn sleepy_identify() -> Extend {
    extend::identify(IdentifyArgs { is_sleepy: true })
}

fn temperature() -> Result<Extend, ConverterError> {
    extend::temperature(ReportingPolicy::Disabled)
}

fn humidity() -> Result<Extend, ConverterError> {
    extend::humidity(ReportingPolicy::Disabled)
}

fn enum_setting(
    name: &str,
    cluster: Cluster,
    lookup: &[(&str, i64)],
    description: &str,
) -> Result<Extend, ConverterError> {
    let mut args = EnumLookupArgs::new(name, cluster, attr::PRESENT_VALUE, lookup.iter().copied());
    args.description = description.to_string();
    args.access = AccessMode::ReadWrite;
    args.reporting = ReportingPolicy::Disabled;
    extend::enum_lookup(args)
}

fn numeric_setting(
    name: &str,
    cluster: Cluster,
    unit: &str,
    (min, max, step): (f64, f64, f64),
    description: &str,
) -> Result<Extend, ConverterError> {
    let mut args = NumericArgs::new(name, cluster, attr::PRESENT_VALUE);
    args.description = description.to_string();
    args.unit = Some(unit.to_string());
    args.access = AccessMode::ReadWrite;
    args.value_min = Some(min);
    args.value_max = Some(max);
    args.value_step = Some(step);
    args.reporting = ReportingPolicy::Disabled;
    extend::numeric(args)
}

fn binary_state(
    name: &str,
    on: (&str, i64),
    off: (&str, i64),
    description: &str,
) -> Result<Extend, ConverterError> {
    let mut args = BinaryArgs::new(
        name,
        Cluster::GenBinaryInput,
        attr::PRESENT_VALUE,
        BinaryValue::new(on.0, on.1),
        BinaryValue::new(off.0, off.1),
    );
    args.description = description.to_string();
    args.reporting = ReportingPolicy::Disabled;
    extend::binary(args)
}

fn contact() -> Result<Extend, ConverterError> {
    binary_state(
        "contact",
        ("ON", 0x01),
        ("OFF", 0x00),
        "Indicates if the contact is closed (= true) or open (= false)",
    )
}

fn device(model: &str, description: &str) -> DefinitionBuilder {
    DefinitionBuilder::new(model)
        .vendor(VENDOR)
        .description(description)
        .ota(true)
}

pub fn pok001() -> Result<DeviceDefinition, ConverterError> {
    device("POK001", "Battery powered retrofit valve")
        .extend(valve_on_off()?)
        .extend(battery(true))
        .extend(valve_status()?)
        .extend(sleepy_identify())
        .extend(enum_setting(
            "kamikaze",
            Cluster::GenBinaryValue,
            &[("OFF", 0), ("ON", 1)],
            "Allow operation on low battery (can destroy battery)",
        )?)
        .extend(stall_time()?)
        .extend(enum_setting(
            "battery_type",
            Cluster::GenMultistateOutput,
            &[("LIION", 0), ("ALKALINE", 1), ("NIMH", 2)],
            "Battery type",
        )?)
        .extend(numeric_setting(
            "end_lag",
            Cluster::GenAnalogValue,
            "°",
            (0.0, 15.0, 1.0),
            "Endstop lag angle (wrong value can cause damage)",
        )?)
        .build()
}

pub fn pok002_pok007() -> Result<DeviceDefinition, ConverterError> {
    device("POK002_POK007", "Soil moisture and temperature sensor")
        .zigbee_models(["POK002", "POK007"])
        .extend(humidity()?)
        .extend(temperature()?)
        .extend(battery(false))
        .build()
}

fn water_level(model: &str) -> Result<DeviceDefinition, ConverterError> {
    device(model, "Water level and temperature sensor")
        .extend(contact()?)
        .extend(temperature()?)
        .extend(battery(false))
        .build()
}

pub fn pok003() -> Result<DeviceDefinition, ConverterError> {
    water_level("POK003")
}

pub fn pok004() -> Result<DeviceDefinition, ConverterError> {
    device("POK004", "Solar powered zigbee router and illuminance sensor")
        .extend(extend::illuminance(ReportingPolicy::Disabled))
        .extend(battery(false))
        .build()
}

pub fn pok005() -> Result<DeviceDefinition, ConverterError> {
    device("POK005", "Temperature and Humidity sensor")
        .extend(humidity()?)
        .extend(temperature()?)
        .extend(battery(false))
        .build()
}

pub fn pok006() -> Result<DeviceDefinition, ConverterError> {
    device("POK006", "Battery powered garden valve")
        .extend(valve_on_off()?)
        .extend(battery(true))
        .extend(valve_status()?)
        .extend(sleepy_identify())
        .extend(stall_time()?)
        .build()
}

pub fn pok008() -> Result<DeviceDefinition, ConverterError> {
    device("POK008", "Battery powered thermostat relay")
        .extend(valve_on_off()?)
        .extend(battery(false))
        .extend(temperature()?)
        .extend(numeric_setting(
            "tgt_temperature",
            Cluster::GenAnalogOutput,
            "C",
            (-45.0, 125.0, 1.0),
            "Target temperature",
        )?)
        .extend(numeric_setting(
            "hysteresis",
            Cluster::GenAnalogValue,
            "C",
            (0.1, 40.0, 0.1),
            "Temperature hysteresis",
        )?)
        .extend(enum_setting(
            "set_op_mode",
            Cluster::GenMultistateOutput,
            &[
                ("monitor", 0),
                ("heater", 1),
                ("cooler", 2),
                ("monitor_inverted", 3),
                ("heater_inverted", 4),
                ("cooler_inverted", 5),
            ],
            "Operation mode",
        )?)
        .build()
}

pub fn pok009() -> Result<DeviceDefinition, ConverterError> {
    let mut ext_voltage = NumericArgs::new("ext_voltage", Cluster::GenAnalogInput, attr::PRESENT_VALUE);
    ext_voltage.description = "Mains voltage".to_string();
    ext_voltage.unit = Some("V".to_string());
    ext_voltage.precision = Some(1);
    ext_voltage.reporting = ReportingPolicy::Disabled;

    device("POK009", "Voltage monitor")
        .extend(extend::numeric(ext_voltage)?)
        .extend(binary_state(
            "comp_state",
            ("NORMAL", 0x01),
            ("LOW", 0x00),
            "Voltage status",
        )?)
        .extend(numeric_setting(
            "tgt_voltage",
            Cluster::GenMultistateValue,
            "V",
            (4.0, 340.0, 1.0),
            "Voltage threshold",
        )?)
        .extend(enum_setting(
            "voltage_type",
            Cluster::GenMultistateOutput,
            &[("AC", 0), ("DC", 1)],
            "Mode",
        )?)
        .extend(sleepy_identify())
        .extend(battery(true))
        .build()
}

pub fn pok010() -> Result<DeviceDefinition, ConverterError> {
    water_level("POK010")
}

pub fn pok011() -> Result<DeviceDefinition, ConverterError> {
    device("POK011", "Illuminance sensor")
        .extend(extend::illuminance(ReportingPolicy::Disabled))
        .extend(battery(false))
        .build()
}

pub fn pok012() -> Result<DeviceDefinition, ConverterError> {
    let mut battery_state = EnumLookupArgs::new(
        "battery_state",
        Cluster::GenMultistateInput,
        attr::PRESENT_VALUE,
        [("missing", 0), ("charging", 1), ("full", 2), ("discharging", 3)],
    );
    battery_state.description = "Battery state".to_string();
    battery_state.reporting = ReportingPolicy::Disabled;

    device("POK012", "20 dBm Zigbee router with battery backup for indoor/outdoor use")
        .extend(extend::enum_lookup(battery_state)?)
        .extend(extend::ias_zone_alarm(IasZoneArgs {
            zone_type: IasZoneType::Generic,
            zone_attributes: vec![IasZoneAttribute::AcStatus, IasZoneAttribute::BatteryDefect],
        }))
        .extend(battery(false))
        .build()
}

fn probe(model: &str, description: &str) -> Result<DeviceDefinition, ConverterError> {
    device(model, description)
        .extend(extended_temperature())
        .extend(battery(false))
        .build()
}

pub fn pok014() -> Result<DeviceDefinition, ConverterError> {
    probe("POK014", "External probe temperature sensor: k-type")
}

pub fn pok015() -> Result<DeviceDefinition, ConverterError> {
    probe("POK015", "External probe temperature sensor: pt1000")
}

/// Every PushOk definition.
pub fn definitions() -> Result<Vec<DeviceDefinition>, ConverterError> {
    Ok(vec![
        pok001()?,
        pok002_pok007()?,
        pok003()?,
        pok004()?,
        pok005()?,
        pok006()?,
        pok008()?,
        pok009()?,
        pok010()?,
        pok011()?,
        pok012()?,
        pok014()?,
        pok015()?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::StaticReporting;
    use crate::zcl::{WireOperation, WireValue};
    use serde_json::json;

    fn temperature_event(values: &[(u16, i64)]) -> InboundEvent {
        InboundEvent::report(
            Cluster::MsTemperatureMeasurement,
            values.iter().map(|&(a, v)| (a, WireValue::Int(v))),
        )
    }

    #[test]
    fn test_every_definition_builds() {
        let definitions = definitions().unwrap();
        assert_eq!(definitions.len(), 13);
        assert!(definitions.iter().all(|d| d.vendor() == VENDOR && d.ota()));
    }

    #[test]
    fn test_extended_temperature() {
        let definition = pok014().unwrap();
        let base = temperature_event(&[(attr::MEASURED_VALUE, 2350)]);
        assert_eq!(definition.decode(&base).get("temperature"), Some(&json!(23.5)));

        let extended = temperature_event(&[
            (attr::MEASURED_VALUE, 2350),
            (attr::TEMPERATURE_EXTENDED_PRECISION, 4),
        ]);
        assert_eq!(definition.decode(&extended).get("temperature"), Some(&json!(23.9)));

        let extension_only = temperature_event(&[(attr::TEMPERATURE_EXTENDED_PRECISION, 4)]);
        assert!(definition.decode(&extension_only).is_empty());

        assert_eq!(
            definition.capability("temperature").unwrap().exposes()[0].access,
            AccessMode::ReadReport
        );
        assert!(definition.encode("temperature", &json!(20), None).is_err());
    }

    #[test]
    fn test_valve_status_and_stall_time() {
        let definition = pok006().unwrap();
        let status = InboundEvent::report(
            Cluster::GenMultistateInput,
            [(attr::PRESENT_VALUE, WireValue::Int(2))],
        );
        assert_eq!(definition.decode(&status).get("status"), Some(&json!("MOVING")));

        let unknown = InboundEvent::report(
            Cluster::GenMultistateInput,
            [(attr::PRESENT_VALUE, WireValue::Int(9))],
        );
        assert!(definition.decode(&unknown).is_empty());

        assert_eq!(
            definition.encode("stall_time", &json!(45), None).unwrap(),
            vec![WireOperation::Write {
                address: WireAddress::new(Cluster::GenMultistateValue, attr::PRESENT_VALUE),
                value: WireValue::Int(45),
            }]
        );
        assert!(matches!(
            definition.encode("stall_time", &json!(75), None),
            Err(ConverterError::OutOfRange { .. })
        ));
        assert!(definition.sleepy());
    }

    #[test]
    fn test_contact_binary() {
        let definition = pok003().unwrap();
        let closed = InboundEvent::report(
            Cluster::GenBinaryInput,
            [(attr::PRESENT_VALUE, WireValue::Int(1))],
        );
        assert_eq!(definition.decode(&closed).get("contact"), Some(&json!("ON")));
        assert!(matches!(
            definition.encode("contact", &json!("ON"), None),
            Err(ConverterError::CapabilityNotWritable(_))
        ));
    }

    #[test]
    fn test_hysteresis_step() {
        let definition = pok008().unwrap();
        assert!(definition.encode("hysteresis", &json!(0.3), None).is_ok());
        assert!(definition.encode("hysteresis", &json!(0.05), None).is_err());
    }

    #[test]
    fn test_reporting_is_disabled_throughout() {
        let reporting = StaticReporting::default();
        for definition in definitions().unwrap() {
            assert!(
                definition.configure(&reporting).is_empty(),
                "{} configures reporting",
                definition.model()
            );
        }
    }

    #[test]
    fn test_schema_order_follows_composition() {
        let definition = pok002_pok007().unwrap();
        let names: Vec<&str> = definition.exposes().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["humidity", "temperature", "battery", "voltage"]);
    }
}
