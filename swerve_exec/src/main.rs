//! Main swerve executable entry point.
//!
//! # Architecture
//!
//! The executable runs a single autonomous routine against loopback
//! equipment:
//!
//!     - Initialise the session, logging and parameters
//!     - Build the chassis, mechanisms and command registry
//!     - Tick the scheduler, chassis and mechanisms at their own periods
//!       until the routine completes
//!     - Save the final pose into the session directory

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{info, warn};
use serde::Serialize;
use std::{path::PathBuf, sync::Arc};
use structopt::StructOpt;

// Internal
use swerve_lib::{
    auto::{default_registry, AutoParams, CommandCtx, Scheduler},
    eqpt::Drivetrain,
    loc::Pose2D,
    loopback::{LoopbackChassis, LoopbackElevator, LoopbackIntake, LoopbackParams},
    swerve_ctrl::{SwerveCtrl, SwerveCtrlParams},
    tick::{CancelToken, RunSummary, Ticker}
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    script_interpreter::ScriptInterpreter,
    session::Session,
    time::SessionClock
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "swerve_exec", about = "Runs an autonomous swerve drive routine")]
struct Opt {
    /// Path to the routine script
    #[structopt(parse(from_os_str))]
    script: PathBuf,

    /// Minimum log level: info, debug or trace
    #[structopt(long, default_value = "debug")]
    log_level: LevelFilter,

    /// Stop after this many steps even if the routine has not finished
    #[structopt(long)]
    max_cycles: Option<u64>,

    /// Calibrate the steer encoders at their current position before running
    #[structopt(long)]
    calibrate: bool
}

/// Written to the session directory at the end of the run.
#[derive(Serialize)]
struct FinalReport {
    pose: Pose2D,
    run: RunSummary
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("swerve_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    logger_init(opt.log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Swerve Executable\n");
    info!(
        "Software root: {:?}",
        host::get_sw_root().wrap_err("Failed to get the software root")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let swerve_params: SwerveCtrlParams = util::params::load("swerve_ctrl.toml")
        .wrap_err("Could not load swerve control params")?;
    let auto_params: AutoParams = util::params::load("auto.toml")
        .wrap_err("Could not load autonomy params")?;
    let loopback_params: LoopbackParams = util::params::load("loopback.toml")
        .wrap_err("Could not load loopback params")?;

    info!("Parameters loaded");

    // ---- LOAD SCRIPT ----

    info!("Loading script from {:?}", opt.script);

    let script = ScriptInterpreter::new(&opt.script)
        .wrap_err("Failed to load script")?;

    info!("Loaded script contains {} lines\n", script.get_num_lines());

    // ---- INITIALISE EQUIPMENT AND MODULES ----

    let chassis = LoopbackChassis::new(loopback_params.clone(), &swerve_params.steer_encoder);
    let elevator = LoopbackElevator::new(&loopback_params);
    let intake = LoopbackIntake::new();

    let chassis_period_s = swerve_params.period_s;

    let (mut swerve_ctrl, swerve_handle) = SwerveCtrl::new(
        swerve_params,
        chassis.module_eqpt(),
        chassis.orientation_sensor()
    ).wrap_err("Failed to initialise SwerveCtrl")?;

    if opt.calibrate {
        let offsets = swerve_ctrl.calibrate_modules();
        session.save_json("steer_offsets.json", &offsets)
            .wrap_err("Failed to save the steer offsets")?;
        info!("Steer offsets {:?} saved to the session", offsets);
    }

    swerve_ctrl.zero_odometry();
    info!("SwerveCtrl init complete");

    let registry = default_registry()
        .wrap_err("Failed to build the command registry")?;

    let ctx = CommandCtx {
        drivetrain: Arc::new(swerve_handle.clone()),
        elevator: Arc::new(elevator.clone()),
        intake: Arc::new(intake),
        params: auto_params.clone()
    };

    let cancel = CancelToken::new();
    let scheduler = Scheduler::new(registry, ctx, script, cancel.clone());

    // Commands set their demands before the chassis acts on them
    let mut ticker = Ticker::new(cancel);
    ticker.add(Box::new(scheduler), auto_params.scheduler_period_s)
        .wrap_err("Failed to add the scheduler")?;
    ticker.add(Box::new(swerve_ctrl), chassis_period_s)
        .wrap_err("Failed to add SwerveCtrl")?;
    ticker.add(Box::new(elevator), chassis_period_s)
        .wrap_err("Failed to add the elevator")?;

    info!("Module initialisation complete\n");

    // ---- RUN ----

    let summary = ticker.run(&SessionClock, opt.max_cycles);

    let pose = swerve_handle.get_position();
    info!(
        "Final pose: ({:.3}, {:.3}, {:.1} deg)",
        pose.x, pose.y, pose.heading_deg
    );

    session.save_json("final_pose.json", &FinalReport { pose, run: summary })
        .wrap_err("Failed to save the final pose")?;

    if !summary.cancelled {
        warn!("Routine stopped before completion");
        return Err(eyre!(
            "Routine did not complete within {} cycles",
            summary.num_steps
        ));
    }

    info!("End of execution");

    Ok(())
}
