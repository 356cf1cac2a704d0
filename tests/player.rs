use bevy_ecs::system::RunSystemOnce;
use glam::IVec2;
use pacman_core::events::PlayerCommand;
use pacman_core::map::direction::Direction;
use pacman_core::map::geometry::tile_of;
use pacman_core::map::maze::Maze;
use pacman_core::systems::{player_control_system, player_movement_system, Player};
use speculoos::prelude::*;

mod common;

use common::{world_pos, TICKS_PER_TILE};

fn corridor_world() -> bevy_ecs::world::World {
    common::create_test_world_with(Maze::new(&common::CORRIDOR_BOARD, &[]).expect("Failed to create corridor maze"))
}

fn command(world: &mut bevy_ecs::world::World, command: PlayerCommand) {
    common::set_input(world, Some(command));
    world.run_system_once(player_control_system).expect("System should run successfully");
    common::set_input(world, None);
}

fn player_state(world: &bevy_ecs::world::World, entity: bevy_ecs::entity::Entity) -> Player {
    *world.get::<Player>(entity).expect("Player should exist")
}

#[test]
fn test_turn_from_rest_is_immediate() {
    let mut world = corridor_world();
    let player = common::spawn_test_player(&mut world, IVec2::new(1, 3));

    command(&mut world, PlayerCommand::MovePlayer(Direction::Up));

    let motion = common::motion(&world, player);
    assert_that(&motion.heading).is_equal_to(Some(Direction::Up));
    assert_that(&motion.next_tile).is_equal_to(world_pos(IVec2::new(1, 2)));
    assert_that(&player_state(&world, player).facing).is_equal_to(Some(Direction::Up));
}

#[test]
fn test_turn_into_wall_is_buffered() {
    let mut world = corridor_world();
    let player = common::spawn_test_player(&mut world, IVec2::new(1, 3));

    command(&mut world, PlayerCommand::MovePlayer(Direction::Down));

    let motion = common::motion(&world, player);
    assert_that(&motion.heading).is_none();
    assert_that(&motion.position).is_equal_to(world_pos(IVec2::new(1, 3)));
    assert_that(&player_state(&world, player).intended).is_equal_to(Some(Direction::Down));
}

#[test]
fn test_buffered_turn_taken_at_first_opening() {
    let mut world = corridor_world();
    let player = common::spawn_test_player(&mut world, IVec2::new(2, 1));
    command(&mut world, PlayerCommand::MovePlayer(Direction::Right));
    common::run_repeatedly(&mut world, player_movement_system, 3);

    // Mid-tile: the turn has to wait
    command(&mut world, PlayerCommand::MovePlayer(Direction::Down));
    assert_that(&common::motion(&world, player).heading).is_equal_to(Some(Direction::Right));

    // (3,2) is a wall, so the player carries on past column 3
    common::run_repeatedly(&mut world, player_movement_system, TICKS_PER_TILE - 3);
    let motion = common::motion(&world, player);
    assert_that(&motion.last_tile).is_equal_to(world_pos(IVec2::new(3, 1)));
    assert_that(&motion.heading).is_equal_to(Some(Direction::Right));

    // Column 4 is open below
    common::run_repeatedly(&mut world, player_movement_system, TICKS_PER_TILE);
    let motion = common::motion(&world, player);
    assert_that(&motion.last_tile).is_equal_to(world_pos(IVec2::new(4, 1)));
    assert_that(&motion.heading).is_equal_to(Some(Direction::Down));
    assert_that(&motion.next_tile).is_equal_to(world_pos(IVec2::new(4, 2)));
    assert_that(&player_state(&world, player).facing).is_equal_to(Some(Direction::Down));
}

#[test]
fn test_reversal_is_immediate_mid_tile() {
    let mut world = corridor_world();
    let player = common::spawn_test_player(&mut world, IVec2::new(2, 3));
    command(&mut world, PlayerCommand::MovePlayer(Direction::Right));
    common::run_repeatedly(&mut world, player_movement_system, 3);
    let before = common::motion(&world, player).position;

    command(&mut world, PlayerCommand::MovePlayer(Direction::Left));

    let motion = common::motion(&world, player);
    assert_that(&motion.position).is_equal_to(before);
    assert_that(&motion.heading).is_equal_to(Some(Direction::Left));
    assert_that(&motion.next_tile).is_equal_to(world_pos(IVec2::new(2, 3)));
    assert_that(&motion.last_tile).is_equal_to(world_pos(IVec2::new(3, 3)));

    // 5.625 units back to the tile centre: two steps of 1.875, then a snap
    common::run_repeatedly(&mut world, player_movement_system, 3);
    let motion = common::motion(&world, player);
    assert_that(&motion.last_tile).is_equal_to(world_pos(IVec2::new(2, 3)));
    assert_that(&motion.heading).is_equal_to(Some(Direction::Left));
}

#[test]
fn test_stop_keeps_facing() {
    let mut world = corridor_world();
    let player = common::spawn_test_player(&mut world, IVec2::new(2, 3));
    command(&mut world, PlayerCommand::MovePlayer(Direction::Right));
    common::run_repeatedly(&mut world, player_movement_system, 3);

    command(&mut world, PlayerCommand::Stop);
    let stopped = common::motion(&world, player);
    assert_that(&stopped.heading).is_none();
    assert_that(&player_state(&world, player).intended).is_none();
    assert_that(&player_state(&world, player).facing).is_equal_to(Some(Direction::Right));

    common::run_repeatedly(&mut world, player_movement_system, 5);
    assert_that(&common::motion(&world, player).position).is_equal_to(stopped.position);
}

#[test]
fn test_stops_against_wall() {
    let mut world = corridor_world();
    let player = common::spawn_test_player(&mut world, IVec2::new(6, 3));
    command(&mut world, PlayerCommand::MovePlayer(Direction::Right));

    common::run_repeatedly(&mut world, player_movement_system, TICKS_PER_TILE);

    let motion = common::motion(&world, player);
    assert_that(&motion.position).is_equal_to(world_pos(IVec2::new(7, 3)));
    assert_that(&motion.heading).is_none();
    assert_that(&motion.is_aligned()).is_true();
    assert_that(&player_state(&world, player).facing).is_equal_to(Some(Direction::Right));

    // Standing still does not move anything
    common::run_repeatedly(&mut world, player_movement_system, 5);
    assert_that(&common::motion(&world, player).position).is_equal_to(world_pos(IVec2::new(7, 3)));
}

#[test]
fn test_wraps_through_tunnel() {
    let mut world =
        common::create_test_world_with(Maze::new(&common::TUNNEL_BOARD, &[]).expect("Failed to create tunnel maze"));
    let player = common::spawn_test_player(&mut world, IVec2::new(8, 2));
    command(&mut world, PlayerCommand::MovePlayer(Direction::Right));

    // Off the right edge onto the margin, then teleported to the left margin
    common::run_repeatedly(&mut world, player_movement_system, TICKS_PER_TILE);
    let motion = common::motion(&world, player);
    assert_that(&tile_of(motion.position)).is_equal_to(IVec2::new(-1, 2));
    assert_that(&motion.next_tile).is_equal_to(world_pos(IVec2::new(0, 2)));

    common::run_repeatedly(&mut world, player_movement_system, TICKS_PER_TILE);
    let motion = common::motion(&world, player);
    assert_that(&motion.last_tile).is_equal_to(world_pos(IVec2::new(0, 2)));
    assert_that(&motion.heading).is_equal_to(Some(Direction::Right));
}
