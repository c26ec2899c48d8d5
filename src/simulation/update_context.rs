use uom::si::f64::*;

/// Provides data unowned by any system in the aircraft system simulation
/// for the purpose of handling an update frame.
#[derive(Clone, Copy, Debug)]
pub struct UpdateContext {
    pub simulation_time: Time,
    pub is_autopilot_engaged: bool,
    pub indicated_airspeed: Velocity,
    pub thrust_lever_angle: [Angle; 2],
    pub gear_animation_position: [Ratio; 2],
}
impl UpdateContext {
    pub fn new(
        simulation_time: Time,
        is_autopilot_engaged: bool,
        indicated_airspeed: Velocity,
        thrust_lever_angle: [Angle; 2],
        gear_animation_position: [Ratio; 2],
    ) -> UpdateContext {
        UpdateContext {
            simulation_time,
            is_autopilot_engaged,
            indicated_airspeed,
            thrust_lever_angle,
            gear_animation_position,
        }
    }
}
