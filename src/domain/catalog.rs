//! Names and codes the service accepts for analyses, element types and
//! network groupings.

use crate::utils::error::{NeplanError, Result};
use std::fmt;
use std::str::FromStr;

macro_rules! service_names {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = NeplanError;

            fn from_str(s: &str) -> Result<Self> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| NeplanError::ValidationError {
                        message: format!("unknown {} '{}'", stringify!($name), s),
                    })
            }
        }
    };
}

macro_rules! service_codes {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $code:expr),+ $(,)? }) => {
        service_names!($(#[$meta])* $name { $($variant),+ });

        impl $name {
            pub fn code(&self) -> i64 {
                match self {
                    $($name::$variant => $code),+
                }
            }
        }
    };
}

service_codes!(NetworkTypeGroup {
    Network = 0,
    Feeder = 1,
    Zone = 2,
    Area = 3,
    Subarea = 4,
    TieFlowBetweenZones = 5,
    TieFlowBetweenAreas = 6,
    VoltageLevel = 7,
});

service_codes!(Phase {
    L1L2L3N = 0,
    L1N = 1,
    L2N = 2,
    L3N = 3,
    L1L2N = 4,
    L1L3N = 5,
    L2L3N = 6,
    L1L2L3N_AS = 7,
});

service_codes!(
    /// Port of a multi-port element.
    PortNr {
        First = 0,
        Second = 1,
        Third = 2,
        Fourth = 3,
    }
);

service_codes!(Units { HV = 0, LV = 1 });

service_names!(PowerSystemAnalysis {
    ArcFlash, CableSizing, CapacitorPlacement, CircuitBreakerPlacement, ContingencyAnalysis,
    DistanceProtection, DynamicAnalysis, ExpressFeeder, FaultFinding, FeederReinforcement,
    FlickerAnalysis, GroundingSystemAnalysis, HarmonicAnalysis, HostingCapacity,
    InvestmentAnalysis, LoadFlow, LoadFlowTimeSimulation, LowVoltageCalculation,
    MotorStartingAnalysis, NeplanDach, NetworkReduction, NTC, OptimalPowerFlow,
    OvercurrentProtection, PhaseSwapping, PipeTypeOptimization, PoleStrengthCalculation,
    PortionOfFeeders, PowerSystemAssessmentERIS, Reliability, Resupply, ShortCircuit,
    SmallSignalStability, SwitchingOptimization, ThermalAnalysis, VoltageRegulatorPlacement,
    VoltageStability,
});

service_names!(GasAnalysis {
    Gas, Gas2DProfile, GasContingencyAnalysis, GasTimeSimulation, GasTransientAnalysis,
    InteractiveDistributionGW, PressureProfileGW, TimeDistributionGW,
});

service_names!(WaterAnalysis {
    FireWater, InteractiveDistributionGW, PressureProfileGW, TimeDistributionGW, Water,
    Water2DProfile, WaterContingencyAnalysis, WaterTimeSimulation, WaterTransientAnalysis,
});

service_names!(DistrictHeatingAnalysis {
    DistrictHeating, DistrictHeating2DProfile, DistrictHeatingContingencyAnalysis,
    DistrictHeatingTimeSimulation, DistrictHeatingTransientAnalysis,
});

service_names!(PowerSystemElement {
    ACCompressedAirEnergyStorage, ACDisperseGenerator, ACFlyWheel, AsynchronousMachine, Busbar,
    BusbarCoupler, CircuitBreaker, CircuitBreakerOnElem, CompositeLoad, CurrentTransformer,
    CustomerConnection, DCBattery, DCConverter, DCConverter3Pole, DCFlyWheel, DCFuelCell,
    DCGround, DCLine, DCLoad, DCMotor, DCNode, DCPhotoVoltaic, DCReactor, DCShunt,
    DCVoltageSource, DFIG, DisconnectSwitch, DisconnectSwitchOnElem, DistanceRelais,
    EarthingSystem, EarthSwitch, EnergyStorage, EquivalentSerieLF, EquivalentSerieSC,
    EquivalentShuntLF, EquivalentShuntSC, ExternalGrid, FaultIndicator, Filter,
    FrequencyRelais, FunctionBlock, Fuse, GenericModel, GroundElement, HarmonicCurrentSource,
    HarmonicVoltageSource, Inertia, Line, LineAsym, LineCoupling, LineSection, Load,
    LoadSwitch, LoadSwitchOnElem, MeasurementDevice, MechanicalLoad, MinMaxRelaisOnLink,
    MinMaxRelaisOnNode, MultiFunctionProtection, NestedBlockCCT, OvercurrentRelais,
    ParallelRLC, PoleSlipRelais, PowerRelais, PWM, PWM3Pole, Pylon, Reactor, Regulator,
    SerieEarthRLC, SerieRLC, SerieTransformator, Shunt, STATCOM, Station, SurgeArrester, SVC,
    SynchronousMachine, Table, TCSC, Trafo2Winding, Trafo3Winding, Trafo4Winding,
    TrafoRegulator, UPFC, UserDefinedPort0, UserDefinedPort1, UserDefinedPort2,
    UserDefinedPort3, UserDefinedPort4, VoltageRelais, VoltageTransformer,
});

service_names!(GasElement {
    GasCentrifugalPump, GasCirculationPump, GasFitting, GasNode, GasPipe, GasPressureRegulator,
    GasShutOffValve, GasSpecialLoad, GasStation, GasValve, Trafo2WindingAsym,
});

service_names!(WaterElement {
    WaterCentrifugalPump, WaterCirculationPump, WaterFitting, WaterHydrant, WaterNode,
    WaterPipe, WaterReservoir, WaterShutOffValve, WaterSpecialLoad, WaterStation, WaterValve,
});

service_names!(HeatingElement {
    HeatingCentrifugalPump, HeatingCirculationPump, HeatingFitting, HeatingLoad, HeatingNode,
    HeatingPipe, HeatingPlant, HeatingPressureRegulator, HeatingShutOffValve,
    HeatingSpecialLoad, HeatingStation, HeatingValve,
});

/// Analysis module of any network family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    PowerSystem(PowerSystemAnalysis),
    Gas(GasAnalysis),
    Water(WaterAnalysis),
    DistrictHeating(DistrictHeatingAnalysis),
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::PowerSystem(a) => a.as_str(),
            AnalysisKind::Gas(a) => a.as_str(),
            AnalysisKind::Water(a) => a.as_str(),
            AnalysisKind::DistrictHeating(a) => a.as_str(),
        }
    }
}

impl Default for AnalysisKind {
    fn default() -> Self {
        AnalysisKind::PowerSystem(PowerSystemAnalysis::LoadFlow)
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = NeplanError;

    fn from_str(s: &str) -> Result<Self> {
        s.parse()
            .map(AnalysisKind::PowerSystem)
            .or_else(|_| s.parse().map(AnalysisKind::Gas))
            .or_else(|_| s.parse().map(AnalysisKind::Water))
            .or_else(|_| s.parse().map(AnalysisKind::DistrictHeating))
            .map_err(|_| NeplanError::ValidationError {
                message: format!("unknown analysis type '{}'", s),
            })
    }
}

/// Element type of any network family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    PowerSystem(PowerSystemElement),
    Gas(GasElement),
    Water(WaterElement),
    Heating(HeatingElement),
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::PowerSystem(e) => e.as_str(),
            ElementKind::Gas(e) => e.as_str(),
            ElementKind::Water(e) => e.as_str(),
            ElementKind::Heating(e) => e.as_str(),
        }
    }
}

impl Default for ElementKind {
    fn default() -> Self {
        ElementKind::PowerSystem(PowerSystemElement::Line)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = NeplanError;

    fn from_str(s: &str) -> Result<Self> {
        s.parse()
            .map(ElementKind::PowerSystem)
            .or_else(|_| s.parse().map(ElementKind::Gas))
            .or_else(|_| s.parse().map(ElementKind::Water))
            .or_else(|_| s.parse().map(ElementKind::Heating))
            .map_err(|_| NeplanError::ValidationError {
                message: format!("unknown element type '{}'", s),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_flow_is_default_analysis() {
        assert_eq!(AnalysisKind::default().as_str(), "LoadFlow");
        assert_eq!(ElementKind::default().as_str(), "Line");
    }

    #[test]
    fn parses_across_families_case_insensitively() {
        assert_eq!(
            "shortcircuit".parse::<AnalysisKind>().unwrap(),
            AnalysisKind::PowerSystem(PowerSystemAnalysis::ShortCircuit)
        );
        assert_eq!(
            "WaterTimeSimulation".parse::<AnalysisKind>().unwrap(),
            AnalysisKind::Water(WaterAnalysis::WaterTimeSimulation)
        );
        assert_eq!(
            "HeatingPipe".parse::<ElementKind>().unwrap(),
            ElementKind::Heating(HeatingElement::HeatingPipe)
        );
        assert!("Teleportation".parse::<AnalysisKind>().is_err());
        assert!("Toaster".parse::<ElementKind>().is_err());
    }

    #[test]
    fn codes_follow_service_numbering() {
        assert_eq!(NetworkTypeGroup::VoltageLevel.code(), 7);
        assert_eq!(Phase::L1L2L3N_AS.code(), 7);
        assert_eq!(PortNr::Second.code(), 1);
        assert_eq!(Units::LV.code(), 1);
        assert_eq!(Phase::ALL.len(), 8);
        assert_eq!("subarea".parse::<NetworkTypeGroup>().unwrap(), NetworkTypeGroup::Subarea);
    }
}
