use bevy::prelude::*;
use maze_core::{load_game_config, load_level, GameConfig, Level};
use maze_physics::{PhysicsPlugin, PhysicsState};

mod player;

use player::{spawn_player, PlayerInputConfig, PlayerPlugin};

const DEFAULT_CONFIG: &str = "assets/maze.json";

/// The loaded game configuration.
#[derive(Resource)]
struct Settings(GameConfig);

fn main() -> AppExit {
    let mut app = App::new();
    app.add_plugins(DefaultPlugins);

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = match load_game_config(&path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load game config {}: {}", path, e);
            return AppExit::error();
        }
    };
    let level = match load_level(&config.level) {
        Ok(level) => level,
        Err(e) => {
            error!("Failed to load level {}: {}", config.level.image.display(), e);
            return AppExit::error();
        }
    };

    app.add_plugins(PhysicsPlugin {
        gravity: config.physics.gravity(),
    })
    .add_plugins(PlayerPlugin)
    .insert_resource(PlayerInputConfig {
        sprint_multiplier: config.movement.sprint_multiplier,
        ..default()
    })
    .insert_resource(ClearColor(Color::srgb(0.02, 0.02, 0.03)))
    .insert_resource(level)
    .insert_resource(Settings(config))
    .add_systems(Startup, setup)
    .run()
}

fn setup(
    mut commands: Commands,
    mut physics: ResMut<PhysicsState>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    level: Res<Level>,
    settings: Res<Settings>,
) {
    physics.spawn_level_colliders(&level);
    spawn_level_meshes(&mut commands, &mut meshes, &mut materials, &level);
    spawn_player(&mut commands, &mut physics, &level, &settings.0);
}

/// One cuboid per blocking cell plus a floor under the whole grid.
fn spawn_level_meshes(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    level: &Level,
) {
    let grid = level.grid();
    let wall_mesh = meshes.add(Cuboid::from_size(grid.cell_size));
    let wall_material = materials.add(Color::srgb(0.45, 0.42, 0.4));

    for cell in level.blocking_cells() {
        commands.spawn((
            Mesh3d(wall_mesh.clone()),
            MeshMaterial3d(wall_material.clone()),
            Transform::from_translation(grid.cell_to_world(cell)),
        ));
    }

    let (min, max) = grid.world_bounds();
    let size = max - min;
    let center = (min + max) * 0.5;
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(size.x, 0.1, size.z))),
        MeshMaterial3d(materials.add(Color::srgb(0.25, 0.25, 0.28))),
        Transform::from_xyz(center.x, min.y - 0.05, center.z),
    ));
}
