use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct SceneSettings {
    pub sky_color: Color,
    pub sun_position: Vec3,
    pub sun_illuminance: f32,
    pub ambient_color: Color,
    pub ambient_brightness: f32,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            // #87CEEB
            sky_color: Color::srgb_u8(0x87, 0xCE, 0xEB),
            sun_position: Vec3::new(40.0, 60.0, 35.0),
            sun_illuminance: 10_000.0,
            ambient_color: Color::WHITE,
            ambient_brightness: 400.0,
        }
    }
}

pub fn setup_world(mut commands: Commands, settings: Res<SceneSettings>) {
    commands.insert_resource(ClearColor(settings.sky_color));
    commands.insert_resource(AmbientLight {
        color: settings.ambient_color,
        brightness: settings.ambient_brightness,
        affects_lightmapped_meshes: true,
    });

    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            illuminance: settings.sun_illuminance,
            ..default()
        },
        Transform::from_translation(settings.sun_position).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}
