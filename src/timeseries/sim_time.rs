use bevy_app::{App, First, Plugin};
use bevy_ecs::prelude::*;
use derive_more::derive::{Add, Div, From, Into, Mul};
use serde::{Deserialize, Serialize};
/// Macro step size of the dynamic simulation.
#[derive(PartialEq, Debug, Clone, Copy, Default, From, Into, Add, Mul, Div, Resource, Serialize, Deserialize)]
pub struct DeltaTime(pub f64); // in seconds
#[derive(PartialEq, Debug, Clone, Copy, Default, From, Into, Add, Mul, Div, Resource, Serialize, Deserialize)]
pub struct Time(pub f64); // in seconds

impl Time {
    pub fn elapsed_seconds(&self) -> f64 {
        self.0
    }
}

pub fn advance(mut t: ResMut<Time>, dt: Res<DeltaTime>) {
    t.0 += dt.0;
}
#[derive(Default)]
pub struct TimePlugin;
impl Plugin for TimePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DeltaTime>();
        app.init_resource::<Time>();
        app.add_systems(First, advance);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_time_advances_on_update() {
        let mut app = App::new();
        app.add_plugins(TimePlugin);
        app.insert_resource(DeltaTime(0.25));
        app.update();
        app.update();
        assert_eq!(app.world().resource::<Time>().elapsed_seconds(), 0.5);
    }
}
