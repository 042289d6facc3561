//! First-person player: spawning, keyboard and mouse input.
//!
//! - W/S (or Up/Down) move forward/backward relative to the player's facing
//! - A/D (or Left/Right) turn the player (yaw)
//! - Middle mouse drag looks around (yaw, clamped pitch)
//! - Shift sprints, Space jumps
//! - L toggles the player's light between dim and warm
//! - Backquote toggles noclip; E/Q fly up/down while it is on

use bevy::input::mouse::AccumulatedMouseMotion;
use bevy::prelude::*;
use maze_core::{GameConfig, Level, MovementController, PhysicsBody};
use maze_physics::{body_id, FrameStage, GridProbe, Noclip, PhysicsState, RigidBodyLink};

/// Light colour when the lamp is off (#3a3a4f).
pub const LIGHT_DIM: Color = Color::srgb(0.227, 0.227, 0.310);
/// Light colour when the lamp is on (#f8c377).
pub const LIGHT_WARM: Color = Color::srgb(0.973, 0.765, 0.467);

/// Camera pitch limit in radians, both directions.
pub const PITCH_LIMIT: f32 = 1.0;

/// Plugin that adds player input handling.
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerInputConfig>()
            .add_systems(Update, player_input_system.in_set(FrameStage::Input));
    }
}

/// Input tuning that is not part of the movement model.
#[derive(Resource)]
pub struct PlayerInputConfig {
    /// Turn speed for A/D rotation (radians/sec)
    pub turn_speed: f32,
    /// Max speed multiplier while Shift is held
    pub sprint_multiplier: f32,
    /// Extra max speed multiplier in noclip, stacks with sprint
    pub noclip_multiplier: f32,
    /// Vertical speed for E/Q in noclip (units/sec)
    pub fly_speed: f32,
    /// Radians per pixel of mouse drag
    pub mouse_sensitivity: f32,
}

impl Default for PlayerInputConfig {
    fn default() -> Self {
        Self {
            turn_speed: 2.0,
            sprint_multiplier: 2.0,
            noclip_multiplier: 3.0,
            fly_speed: 3.0,
            mouse_sensitivity: 0.003,
        }
    }
}

/// Marks the player actor. The body's rotation is locked, so facing lives here.
#[derive(Component, Default)]
pub struct PlayerCharacter {
    /// Facing direction (yaw in radians)
    pub yaw: f32,
    /// Camera pitch in radians, within [`PITCH_LIMIT`]
    pub pitch: f32,
    pub noclip: bool,
    /// Body height restored when noclip is switched off
    pub ground_height: f32,
}

impl PlayerCharacter {
    /// Apply one frame of mouse drag (pixels).
    pub fn look(&mut self, delta: Vec2, sensitivity: f32) {
        self.yaw += delta.x * sensitivity;
        self.pitch = (self.pitch - delta.y * sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }
}

/// Marks the player's eye camera.
#[derive(Component)]
pub struct PlayerCamera;

/// Marks the light carried by the player.
#[derive(Component)]
pub struct PlayerLight;

/// World-space move direction for a yaw and a forward amount (-1, 0 or 1).
///
/// Yaw 0 faces -Z.
pub fn move_direction(yaw: f32, forward: f32) -> Vec3 {
    Quat::from_rotation_y(-yaw) * Vec3::new(0.0, 0.0, -forward)
}

/// Max speed multiplier for the current input, `None` when unmodified.
pub fn speed_multiplier(config: &PlayerInputConfig, sprint: bool, noclip: bool) -> Option<f32> {
    let mut multiplier = 1.0;
    if sprint {
        multiplier *= config.sprint_multiplier;
    }
    if noclip {
        multiplier *= config.noclip_multiplier;
    }
    (multiplier != 1.0).then_some(multiplier)
}

/// The other of the two lamp colours.
pub fn toggle_light_color(current: Color) -> Color {
    if current == LIGHT_WARM {
        LIGHT_DIM
    } else {
        LIGHT_WARM
    }
}

/// Spawn the player body, its controller, camera and light at the configured cell.
pub fn spawn_player(
    commands: &mut Commands,
    physics: &mut PhysicsState,
    level: &Level,
    config: &GameConfig,
) -> Entity {
    let grid = level.grid();
    let player = &config.player;
    let [x, z] = player.spawn_cell;
    if level.is_wall(x, z, 0) {
        warn!("Player spawn cell ({}, {}) is blocked", x, z);
    }

    let (min, _) = grid.world_bounds();
    let half_extent = player.height * 0.5 + player.radius;
    let mut position = grid.cell_to_world(IVec3::new(x, 0, z));
    position.y = min.y + half_extent + 0.05;

    let handle = physics.spawn_actor(position, player.radius, player.height, player.mass);
    let mut controller = MovementController::from_config(&config.movement);
    controller.attach(body_id(handle));

    info!("Spawning player at cell ({}, {}) -> {:?}", x, z, position);

    commands
        .spawn((
            Transform::from_translation(position),
            Visibility::default(),
            PlayerCharacter {
                ground_height: position.y,
                ..default()
            },
            controller,
            GridProbe {
                last_position: position,
            },
            RigidBodyLink(handle),
        ))
        .with_children(|parent| {
            parent.spawn((
                Camera3d::default(),
                Transform::from_xyz(0.0, player.height * 0.5, 0.0),
                PlayerCamera,
            ));
            parent.spawn((
                PointLight {
                    color: LIGHT_DIM,
                    intensity: 200_000.0,
                    range: 64.0,
                    shadows_enabled: true,
                    ..default()
                },
                Transform::from_xyz(0.0, player.height * 0.5, 0.0),
                PlayerLight,
            ));
        })
        .id()
}

fn player_input_system(
    mut commands: Commands,
    time: Res<Time>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    config: Res<PlayerInputConfig>,
    mut physics: ResMut<PhysicsState>,
    mut players: Query<(
        Entity,
        &mut PlayerCharacter,
        &mut MovementController,
        &mut Transform,
        &RigidBodyLink,
    )>,
    mut cameras: Query<&mut Transform, (With<PlayerCamera>, Without<PlayerCharacter>)>,
    mut lights: Query<&mut PointLight, With<PlayerLight>>,
) {
    let Ok((entity, mut player, mut controller, mut transform, link)) = players.single_mut()
    else {
        return;
    };
    let dt = time.delta_secs();

    let pressed = |keys: [KeyCode; 2]| keys.iter().any(|k| keyboard.pressed(*k));

    if pressed([KeyCode::KeyA, KeyCode::ArrowLeft]) {
        player.yaw -= config.turn_speed * dt;
    }
    if pressed([KeyCode::KeyD, KeyCode::ArrowRight]) {
        player.yaw += config.turn_speed * dt;
    }
    if mouse_button.pressed(MouseButton::Middle) {
        player.look(mouse_motion.delta, config.mouse_sensitivity);
    }
    transform.rotation = Quat::from_rotation_y(-player.yaw);
    for mut camera in cameras.iter_mut() {
        camera.rotation = Quat::from_rotation_x(player.pitch);
    }

    if keyboard.just_pressed(KeyCode::Backquote) {
        player.noclip = !player.noclip;
        physics.set_noclip(link.0, player.noclip);
        if player.noclip {
            commands.entity(entity).insert(Noclip);
        } else {
            commands.entity(entity).remove::<Noclip>();
            if let Some(mut body) = physics.body_mut(link.0) {
                let mut position = body.position();
                position.y = player.ground_height;
                body.set_translation(position);
                let velocity = body.velocity();
                body.set_velocity(Vec3::new(velocity.x, 0.0, velocity.z));
            }
        }
        info!("Noclip {}", if player.noclip { "on" } else { "off" });
    }

    let mut forward = 0.0;
    if pressed([KeyCode::KeyW, KeyCode::ArrowUp]) {
        forward += 1.0;
    }
    if pressed([KeyCode::KeyS, KeyCode::ArrowDown]) {
        forward -= 1.0;
    }
    controller.set_direction(move_direction(player.yaw, forward));

    let sprint = pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
    controller.set_speed_multiplier(speed_multiplier(&config, sprint, player.noclip));

    if player.noclip {
        let mut climb = 0.0;
        if keyboard.pressed(KeyCode::KeyE) {
            climb += config.fly_speed;
        }
        if keyboard.pressed(KeyCode::KeyQ) {
            climb -= config.fly_speed;
        }
        if let Some(mut body) = physics.body_mut(link.0) {
            let velocity = body.velocity();
            body.set_velocity(Vec3::new(velocity.x, climb, velocity.z));
        }
    } else if keyboard.just_pressed(KeyCode::Space) {
        if let Some(mut body) = physics.body_mut(link.0) {
            if controller.jump(&mut body) {
                debug!("Jump");
            }
        }
    }

    if keyboard.just_pressed(KeyCode::KeyL) {
        for mut light in lights.iter_mut() {
            light.color = toggle_light_color(light.color);
        }
    }
}
