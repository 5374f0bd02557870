//! Cyclic processing interface
//!
//! Components stepped once per control cycle, such as a single swerve module
//! controller, expose their step through [`State`] so the caller sees a
//! uniform demand in, measurement and report out shape.

/// A component processed once per control cycle.
pub trait State {
    /// The demand applied on this cycle.
    type InputData;

    /// Measurements taken on this cycle.
    type OutputData;

    /// Diagnostic summary of the cycle, for logging and telemetry.
    type StatusReport;

    /// Failure of the cycle. The component should be left safe (outputs
    /// stopped) when this is returned.
    type ProcError;

    /// Apply `input_data` and return this cycle's measurements and report.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
