//! IAS zone status bits as binary states.

use crate::converter::{AccessMode, CustomConverter, CustomDecode, Expose, FieldRole, PartialState};
use crate::definition::Extend;
use crate::error::ConverterError;
use crate::zcl::{Cluster, InboundEvent, WireAddress, attr};
use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};

/// Zone type, naming the alarm state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum IasZoneType {
    Generic,
    Occupancy,
    Contact,
    WaterLeak,
    Smoke,
    CarbonMonoxide,
    Vibration,
    Rain,
}

impl IasZoneType {
    /// State key carrying alarm bit 0.
    fn alarm_name(self) -> &'static str {
        match self {
            IasZoneType::Generic => "alarm",
            other => other.into(),
        }
    }

    /// A contact sensor reports "alarm" while the contact is open.
    fn inverted(self) -> bool {
        self == IasZoneType::Contact
    }
}

/// Optional zone status bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum IasZoneAttribute {
    Tamper,
    BatteryLow,
    SupervisionReports,
    RestoreReports,
    Trouble,
    AcStatus,
    Test,
    BatteryDefect,
}

impl IasZoneAttribute {
    pub fn bit(self) -> u32 {
        match self {
            IasZoneAttribute::Tamper => 2,
            IasZoneAttribute::BatteryLow => 3,
            IasZoneAttribute::SupervisionReports => 4,
            IasZoneAttribute::RestoreReports => 5,
            IasZoneAttribute::Trouble => 6,
            IasZoneAttribute::AcStatus => 7,
            IasZoneAttribute::Test => 8,
            IasZoneAttribute::BatteryDefect => 9,
        }
    }

    fn description(self) -> &'static str {
        match self {
            IasZoneAttribute::Tamper => "Indicates whether the device is tampered",
            IasZoneAttribute::BatteryLow => "Indicates whether the battery of the device is almost empty",
            IasZoneAttribute::SupervisionReports => "Indicates whether the device issues reports on zone operational status",
            IasZoneAttribute::RestoreReports => "Indicates whether the device issues reports on alarm no longer being present",
            IasZoneAttribute::Trouble => "Indicates whether the device is currently having trouble",
            IasZoneAttribute::AcStatus => "Indicates whether the device mains voltage supply is at fault",
            IasZoneAttribute::Test => "Indicates whether the device is currently performing a test",
            IasZoneAttribute::BatteryDefect => "Indicates whether the device battery is defective",
        }
    }
}

#[derive(Clone, Debug)]
pub struct IasZoneArgs {
    pub zone_type: IasZoneType,
    pub zone_attributes: Vec<IasZoneAttribute>,
}

struct ZoneStatusDecode {
    args: IasZoneArgs,
}

impl CustomDecode for ZoneStatusDecode {
    fn decode(&self, event: &InboundEvent) -> Result<PartialState, ConverterError> {
        let alarm_name = self.args.zone_type.alarm_name();
        let raw = event.require(alarm_name, attr::ZONE_STATUS)?;
        let status = raw.as_code().ok_or_else(|| ConverterError::DecodeMismatch {
            capability: alarm_name.to_string(),
            value: raw.to_string(),
        })?;

        let mut state = PartialState::new();
        let alarm = status & 1 != 0;
        state.insert(
            alarm_name.to_string(),
            Value::Bool(alarm != self.args.zone_type.inverted()),
        );
        for attribute in &self.args.zone_attributes {
            let name: &'static str = (*attribute).into();
            state.insert(name.to_string(), Value::Bool(status & (1 << attribute.bit()) != 0));
        }
        Ok(state)
    }
}

pub fn ias_zone_alarm(args: IasZoneArgs) -> Extend {
    let alarm_name = args.zone_type.alarm_name();
    let mut converter = CustomConverter::new(alarm_name)
        .field(WireAddress::new(Cluster::SsIasZone, attr::ZONE_STATUS), FieldRole::Trigger)
        .expose(
            Expose::binary(alarm_name, AccessMode::ReadReport, true, false)
                .with_description(format!("Indicates whether the {} alarm is active", args.zone_type)),
        );
    for attribute in &args.zone_attributes {
        let name: &'static str = (*attribute).into();
        converter = converter.expose(
            Expose::binary(name, AccessMode::ReadReport, true, false)
                .with_description(attribute.description()),
        );
    }
    converter.decode(ZoneStatusDecode { args }).build().into()
}
