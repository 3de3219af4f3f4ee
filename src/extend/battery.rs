//! Battery level, voltage and low-battery alarm from genPowerCfg.

use crate::converter::{
    AccessMode, CustomConverter, CustomDecode, Expose, FieldRole, PartialState, Scale, number,
};
use crate::definition::Extend;
use crate::error::ConverterError;
use crate::zcl::{Cluster, InboundEvent, WireAddress, attr};
use serde_json::Value;

/// Value the device reports for an unknown percentage or voltage.
const INVALID: i64 = 0xFF;

/// Battery low bits of batteryAlarmState for the three battery sources.
const ALARM_LOW_MASK: i64 = 0x00F0_3C0F;

#[derive(Clone, Copy, Debug)]
pub struct BatteryArgs {
    pub percentage: bool,
    pub voltage: bool,
    pub low_status: bool,
    pub percentage_reporting: bool,
    pub voltage_reporting: bool,
}

impl Default for BatteryArgs {
    fn default() -> Self {
        Self {
            percentage: true,
            voltage: false,
            low_status: true,
            percentage_reporting: true,
            voltage_reporting: false,
        }
    }
}

struct BatteryDecode {
    args: BatteryArgs,
}

impl CustomDecode for BatteryDecode {
    fn decode(&self, event: &InboundEvent) -> Result<PartialState, ConverterError> {
        let mut state = PartialState::new();

        if self.args.percentage
            && let Some(raw) = event.value(attr::BATTERY_PERCENTAGE_REMAINING).and_then(|v| v.as_code())
            && raw != INVALID
        {
            let percent = (raw as f64 / 2.0).round().clamp(0.0, 100.0);
            state.insert("battery".into(), number(percent));
        }
        if self.args.voltage
            && let Some(raw) = event.value(attr::BATTERY_VOLTAGE).and_then(|v| v.as_code())
            && raw != INVALID
        {
            state.insert("voltage".into(), Value::from(raw * 100));
        }
        if self.args.low_status
            && let Some(raw) = event.value(attr::BATTERY_ALARM_STATE).and_then(|v| v.as_code())
        {
            state.insert("battery_low".into(), Value::Bool(raw & ALARM_LOW_MASK != 0));
        }
        Ok(state)
    }
}

pub fn battery(args: BatteryArgs) -> Extend {
    let address = |attribute| WireAddress::new(Cluster::GenPowerCfg, attribute);
    let mut converter = CustomConverter::new("battery");

    if args.percentage {
        converter = converter
            .field(address(attr::BATTERY_PERCENTAGE_REMAINING), FieldRole::Trigger)
            .expose(
                Expose::numeric("battery", AccessMode::ReadReport)
                    .with_unit("%")
                    .with_value_range(0.0, 100.0)
                    .with_description("Remaining battery in %"),
            );
        if args.percentage_reporting {
            converter = converter.report(
                address(attr::BATTERY_PERCENTAGE_REMAINING),
                Scale::Divide(2.0),
            );
        }
    }
    if args.voltage {
        converter = converter
            .field(address(attr::BATTERY_VOLTAGE), FieldRole::Trigger)
            .expose(
                Expose::numeric("voltage", AccessMode::ReadReport)
                    .with_unit("mV")
                    .with_description("Reported battery voltage in millivolts"),
            );
        if args.voltage_reporting {
            converter = converter.report(address(attr::BATTERY_VOLTAGE), Scale::Multiply(100.0));
        }
    }
    if args.low_status {
        converter = converter
            .field(address(attr::BATTERY_ALARM_STATE), FieldRole::Trigger)
            .expose(
                Expose::binary("battery_low", AccessMode::ReadReport, true, false)
                    .with_description("Empty battery indicator"),
            );
    }

    converter.decode(BatteryDecode { args }).build().into()
}
