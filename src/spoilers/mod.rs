use crate::{
    landing_gear::{strut_compression_from_animation, struts_on_ground},
    simulation::UpdateContext,
};
use uom::si::{angle::degree, f64::*, ratio::ratio, time::second, velocity::knot};

const POSITION_RETRACTED: f64 = 0.;
const POSITION_PARTIAL: f64 = 0.5;
const POSITION_FULL: f64 = 1.;
const POSITION_LIMIT_AUTOPILOT: f64 = 0.5;
/// Airspeed in knots around which the landing and take-off phases latch and release.
const CONDITION_AIRSPEED_KNOT: f64 = 72.;
/// Time the aircraft has to be airborne before the landing phase can latch.
const MINIMUM_AIRBORNE_TIME_SECOND: f64 = 10.;
const TLA_IDLE_DEGREE: f64 = 0.;
const TLA_CLB_DEGREE: f64 = 25.;
const TLA_MCT_DEGREE: f64 = 35.;
/// Lever angle above which an automatic deployment is cancelled on a touch and go.
const TLA_TOUCH_AND_GO_DEGREE: f64 = 20.;
const HANDLE_SET_RAW_SCALE: f64 = 16384.;
const HANDLE_AXIS_RAW_SCALE: f64 = 32768.;

fn position(value: f64) -> Ratio {
    Ratio::new::<ratio>(value)
}

fn clamped_position(value: f64) -> Ratio {
    position(value.max(POSITION_RETRACTED).min(POSITION_FULL))
}

fn condition_airspeed() -> Velocity {
    Velocity::new::<knot>(CONDITION_AIRSPEED_KNOT)
}

/// One tick's sensed input in engineering units, with the gear animation
/// positions already converted to strut compression.
#[derive(Clone, Copy)]
struct SensedVariables {
    simulation_time: Time,
    is_autopilot_engaged: bool,
    airspeed: Velocity,
    thrust_lever_angle: [Angle; 2],
    strut_compression: [Ratio; 2],
}
impl SensedVariables {
    fn from_context(context: &UpdateContext) -> Self {
        SensedVariables {
            simulation_time: context.simulation_time,
            is_autopilot_engaged: context.is_autopilot_engaged,
            airspeed: context.indicated_airspeed,
            thrust_lever_angle: context.thrust_lever_angle,
            strut_compression: [
                strut_compression_from_animation(context.gear_animation_position[0]),
                strut_compression_from_animation(context.gear_animation_position[1]),
            ],
        }
    }
}

/// The spoiler system state at one point in simulation time. Updates take
/// the current state by value and return the next, which keeps every state
/// transition testable without an instantiated object graph.
#[derive(Clone, Copy, PartialEq, Debug)]
struct SpoilersState {
    is_armed: bool,
    handle_position: Ratio,
    sim_position: Ratio,
    condition_landing: bool,
    condition_take_off: bool,
    time_airborne: Time,
    simulation_time: Time,
    is_autopilot_engaged: bool,
    airspeed: Velocity,
    thrust_lever_angle: [Angle; 2],
    strut_compression: [Ratio; 2],
}
impl SpoilersState {
    fn new() -> Self {
        SpoilersState {
            is_armed: false,
            handle_position: position(POSITION_RETRACTED),
            sim_position: position(POSITION_RETRACTED),
            condition_landing: false,
            condition_take_off: false,
            time_airborne: Time::new::<second>(0.),
            simulation_time: Time::new::<second>(0.),
            is_autopilot_engaged: false,
            airspeed: Velocity::new::<knot>(0.),
            thrust_lever_angle: [Angle::new::<degree>(TLA_IDLE_DEGREE); 2],
            strut_compression: [position(0.); 2],
        }
    }

    /// The committed snapshot, used when a discrete event re-runs the
    /// pipeline between two periodic updates.
    fn sensed(&self) -> SensedVariables {
        SensedVariables {
            simulation_time: self.simulation_time,
            is_autopilot_engaged: self.is_autopilot_engaged,
            airspeed: self.airspeed,
            thrust_lever_angle: self.thrust_lever_angle,
            strut_compression: self.strut_compression,
        }
    }
}

/// Runs the full update pipeline: manual resolution, autopilot engagement
/// clamp, snapshot commit, phase detection and the deployment policies,
/// in that priority order.
fn updated(
    state: SpoilersState,
    is_armed_request: bool,
    handle_position_request: Ratio,
    vars: SensedVariables,
) -> SpoilersState {
    let was_autopilot_engaged = state.is_autopilot_engaged;
    let mut next = state;

    resolve_manual_request(
        &mut next,
        is_armed_request,
        handle_position_request,
        vars.is_autopilot_engaged,
    );

    // A newly engaging autopilot may not inherit a stale automatic
    // deployment above its ceiling.
    if vars.is_autopilot_engaged && !was_autopilot_engaged {
        next.sim_position = position(
            handle_position_request
                .get::<ratio>()
                .min(POSITION_LIMIT_AUTOPILOT),
        );
    }

    next.simulation_time = vars.simulation_time;
    next.is_autopilot_engaged = vars.is_autopilot_engaged;
    next.airspeed = vars.airspeed;
    next.thrust_lever_angle = vars.thrust_lever_angle;
    next.strut_compression = vars.strut_compression;

    detect_landing_condition(&mut next);
    detect_take_off_condition(&mut next);

    if next.condition_take_off {
        if let Some(target) = take_off_deployment(&next) {
            next.sim_position = target;
        }
    }

    if next.condition_landing {
        if let Some(target) = landing_deployment(&next, vars.thrust_lever_angle) {
            next.sim_position = target;
        }

        if let Some(target) = touch_and_go_retraction(&next) {
            next.sim_position = target;
        }
    }

    next
}

/// Applies a changed armed or handle request. Ground spoilers only arm with
/// the handle retracted, and the handle request is limited to the autopilot
/// ceiling while the autopilot is engaged.
fn resolve_manual_request(
    next: &mut SpoilersState,
    is_armed_request: bool,
    handle_position_request: Ratio,
    is_autopilot_engaged: bool,
) {
    if next.is_armed == is_armed_request && next.handle_position == handle_position_request {
        return;
    }

    next.is_armed = is_armed_request && handle_position_request == position(POSITION_RETRACTED);
    next.handle_position = handle_position_request;
    next.sim_position = if is_autopilot_engaged {
        position(
            handle_position_request
                .get::<ratio>()
                .min(POSITION_LIMIT_AUTOPILOT),
        )
    } else {
        handle_position_request
    };
}

/// The landing phase latches once the aircraft has been airborne for the
/// minimum airborne time and releases below the condition airspeed. A
/// ground touch does not reset the airborne timer; only leaving the phase
/// does.
fn detect_landing_condition(next: &mut SpoilersState) {
    if next.condition_landing {
        if next.airspeed < condition_airspeed() {
            next.condition_landing = false;
            next.time_airborne = Time::new::<second>(0.);
        }
    } else if next.time_airborne.get::<second>() == 0.
        && struts_on_ground(next.strut_compression) == 0
    {
        next.time_airborne = next.simulation_time;
    } else if time_since_airborne(next) >= Time::new::<second>(MINIMUM_AIRBORNE_TIME_SECOND) {
        next.condition_landing = true;
    }
}

/// The take-off phase latches with both main gears on the ground above the
/// condition airspeed and releases below it or once fully airborne.
fn detect_take_off_condition(next: &mut SpoilersState) {
    let gears_on_ground = struts_on_ground(next.strut_compression);
    if gears_on_ground == 2 && next.airspeed > condition_airspeed() {
        next.condition_take_off = true;
    } else if next.airspeed < condition_airspeed() || gears_on_ground == 0 {
        next.condition_take_off = false;
    }
}

fn time_since_airborne(state: &SpoilersState) -> Time {
    if state.time_airborne.get::<second>() > 0. {
        state.simulation_time - state.time_airborne
    } else {
        Time::new::<second>(0.)
    }
}

/// Ground spoiler deployment during a rejected take-off: armed with both
/// levers at or below idle, or one lever pulled into reverse while the
/// other sits at idle.
fn take_off_deployment(next: &SpoilersState) -> Option<Ratio> {
    if (next.is_armed && are_at_or_below_idle(next.thrust_lever_angle))
        || is_one_in_reverse_and_other_at_idle(next.thrust_lever_angle)
    {
        Some(position(POSITION_FULL))
    } else {
        None
    }
}

/// Landing phase deployment rules, evaluated top to bottom with the first
/// matching rule deciding the position.
///
/// The below-climb and reverse-with-other-below-MCT tests read the lever
/// angles passed into this tick, while at-or-below-idle reads the
/// committed snapshot. Take-off logic reacts to settled state, landing
/// logic reacts immediately; do not normalise the two.
fn landing_deployment(next: &SpoilersState, thrust_lever_angle: [Angle; 2]) -> Option<Ratio> {
    let gears_on_ground = struts_on_ground(next.strut_compression);
    let at_or_below_idle = are_at_or_below_idle(next.thrust_lever_angle);
    let below_climb = are_below_climb(thrust_lever_angle);
    let reverse_and_below_mct = is_one_in_reverse_and_other_below_mct(thrust_lever_angle);
    let armed_or_deployed = next.is_armed || next.handle_position > position(POSITION_RETRACTED);

    let rules = [
        (
            armed_or_deployed
                && gears_on_ground == 2
                && (at_or_below_idle || reverse_and_below_mct),
            position(POSITION_FULL),
        ),
        (
            armed_or_deployed && gears_on_ground == 2 && next.is_armed && below_climb,
            position(POSITION_PARTIAL),
        ),
        (
            armed_or_deployed && gears_on_ground == 1 && at_or_below_idle,
            position(next.handle_position.get::<ratio>().max(POSITION_PARTIAL)),
        ),
        (
            !armed_or_deployed && reverse_and_below_mct && gears_on_ground == 2,
            position(POSITION_FULL),
        ),
        (
            !armed_or_deployed && reverse_and_below_mct && gears_on_ground == 1,
            position(POSITION_PARTIAL),
        ),
    ];

    rules
        .iter()
        .find(|(applies, _)| *applies)
        .map(|(_, target)| *target)
}

/// On a touch and go the automatic deployment is cancelled once a lever
/// moves past the touch-and-go angle, while a manually held handle position
/// is preserved.
fn touch_and_go_retraction(next: &SpoilersState) -> Option<Ratio> {
    let any_lever_above_touch_and_go = next
        .thrust_lever_angle
        .iter()
        .any(|&angle| angle > Angle::new::<degree>(TLA_TOUCH_AND_GO_DEGREE));

    if struts_on_ground(next.strut_compression) > 0 && any_lever_above_touch_and_go {
        Some(position(
            next.handle_position.get::<ratio>().max(POSITION_RETRACTED),
        ))
    } else {
        None
    }
}

fn are_at_or_below_idle(thrust_lever_angle: [Angle; 2]) -> bool {
    thrust_lever_angle
        .iter()
        .all(|&angle| angle <= Angle::new::<degree>(TLA_IDLE_DEGREE))
}

fn are_below_climb(thrust_lever_angle: [Angle; 2]) -> bool {
    thrust_lever_angle
        .iter()
        .all(|&angle| angle < Angle::new::<degree>(TLA_CLB_DEGREE))
}

fn is_one_in_reverse_and_other_at_idle([left, right]: [Angle; 2]) -> bool {
    let idle = Angle::new::<degree>(TLA_IDLE_DEGREE);
    (left < idle && right == idle) || (right < idle && left == idle)
}

fn is_one_in_reverse_and_other_below_mct([left, right]: [Angle; 2]) -> bool {
    let idle = Angle::new::<degree>(TLA_IDLE_DEGREE);
    let mct = Angle::new::<degree>(TLA_MCT_DEGREE);
    (left < idle && right < mct) || (right < idle && left < mct)
}

/// Converts pilot and autopilot commands plus sensed aircraft state into a
/// continuous spoiler surface position command and the ground spoiler
/// armed indication.
///
/// Discrete events are expected before the periodic [`update`] within a
/// simulation tick. Every call completes immediately; there is no
/// concurrent access.
///
/// [`update`]: SpoilersHandler::update
pub struct SpoilersHandler {
    is_initialized: bool,
    state: SpoilersState,
}
impl SpoilersHandler {
    pub fn new() -> Self {
        SpoilersHandler {
            is_initialized: false,
            state: SpoilersState::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn is_armed(&self) -> bool {
        self.state.is_armed
    }

    /// The last commanded handle position, 0 retracted to 1 full.
    pub fn handle_position(&self) -> Ratio {
        self.state.handle_position
    }

    /// The commanded surface position. May exceed the handle position due
    /// to automatic ground spoiler deployment.
    pub fn sim_position(&self) -> Ratio {
        self.state.sim_position
    }

    /// Seeds the handle to an externally persisted position. Only the
    /// first call has an effect.
    pub fn set_initial_position(&mut self, initial_position: Ratio) {
        if self.is_initialized {
            return;
        }

        self.apply(
            self.state.is_armed,
            clamped_position(initial_position.get::<ratio>()),
        );
        self.is_initialized = true;
    }

    /// Per tick entry point, to be called every simulation frame after the
    /// discrete events of that frame.
    pub fn update(&mut self, context: &UpdateContext) {
        self.state = updated(
            self.state,
            self.state.is_armed,
            self.state.handle_position,
            SensedVariables::from_context(context),
        );
    }

    pub fn on_spoilers_on(&mut self) {
        self.apply(self.state.is_armed, position(POSITION_FULL));
    }

    pub fn on_spoilers_off(&mut self) {
        self.apply(self.state.is_armed, position(POSITION_RETRACTED));
    }

    pub fn on_spoilers_toggle(&mut self) {
        let target = if self.state.handle_position > position(POSITION_RETRACTED) {
            position(POSITION_RETRACTED)
        } else {
            position(POSITION_FULL)
        };

        self.apply(self.state.is_armed, target);
    }

    pub fn on_spoilers_set(&mut self, value: f64) {
        self.apply(
            self.state.is_armed,
            clamped_position(value / HANDLE_SET_RAW_SCALE),
        );
    }

    /// Bipolar axis input centred at zero maps to mid travel.
    pub fn on_spoilers_axis_set(&mut self, value: f64) {
        self.apply(
            self.state.is_armed,
            clamped_position(0.5 + value / HANDLE_AXIS_RAW_SCALE),
        );
    }

    pub fn on_spoilers_arm_on(&mut self) {
        self.apply(true, self.state.handle_position);
    }

    pub fn on_spoilers_arm_off(&mut self) {
        self.apply(false, self.state.handle_position);
    }

    pub fn on_spoilers_arm_toggle(&mut self) {
        self.apply(!self.state.is_armed, self.state.handle_position);
    }

    pub fn on_spoilers_arm_set(&mut self, value: bool) {
        self.apply(value, self.state.handle_position);
    }

    /// Re-runs the pipeline against the committed snapshot with a new
    /// armed and handle request.
    fn apply(&mut self, is_armed_request: bool, handle_position_request: Ratio) {
        self.state = updated(
            self.state,
            is_armed_request,
            handle_position_request,
            self.state.sensed(),
        );
    }
}
impl Default for SpoilersHandler {
    fn default() -> Self {
        Self::new()
    }
}
