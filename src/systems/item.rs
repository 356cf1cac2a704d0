use bevy_ecs::{
    bundle::Bundle,
    component::Component,
    entity::Entity,
    event::{EventReader, EventWriter},
    query::With,
    resource::Resource,
    system::{Commands, Query, Res, ResMut},
};
use glam::IVec2;
use smallvec::SmallVec;
use strum_macros::AsRefStr;
use tracing::{debug, info, trace};

use crate::{
    constants::MapTile,
    events::{CollisionEvent, GameEvent},
    systems::{
        components::{Collider, DeltaTime, GhostCollider, ItemCollider, ItemCount, PlayerControlled, ScoreResource, Tuning},
        ghost::ModeState,
        movement::Motion,
        player::Player,
        stage::{Countdown, GameStage},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum ItemKind {
    Pellet,
    PowerPellet,
    /// The timed bonus item. Does not count toward clearing the board.
    Bonus,
}

impl ItemKind {
    pub fn points(self, tuning: &Tuning) -> u32 {
        match self {
            ItemKind::Pellet => tuning.pellet_points,
            ItemKind::PowerPellet => tuning.power_pellet_points,
            ItemKind::Bonus => tuning.bonus_points,
        }
    }

    pub fn from_tile(tile: MapTile) -> Option<Self> {
        match tile {
            MapTile::Pellet => Some(ItemKind::Pellet),
            MapTile::PowerPellet => Some(ItemKind::PowerPellet),
            MapTile::Empty | MapTile::Wall => None,
        }
    }
}

/// A stationary collectible sitting on a tile.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collectible {
    pub kind: ItemKind,
    pub tile: IVec2,
    pub points: u32,
}

#[derive(Bundle)]
pub struct ItemBundle {
    pub item: Collectible,
    pub collider: Collider,
    pub item_collider: ItemCollider,
}

impl ItemBundle {
    pub fn new(tile: IVec2, kind: ItemKind, tuning: &Tuning) -> Self {
        Self {
            item: Collectible {
                kind,
                tile,
                points: kind.points(tuning),
            },
            collider: Collider {
                size: tuning.item_hitbox,
            },
            item_collider: ItemCollider,
        }
    }
}

/// Where items go at the start of every round.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemLayout {
    pub items: Vec<(IVec2, ItemKind)>,
    pub bonus: Option<IVec2>,
}

impl ItemLayout {
    /// Items that count toward clearing the board.
    pub fn count(&self) -> u32 {
        self.items.len() as u32
    }
}

/// Time since the round started, until the bonus item appears.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Default)]
pub struct BonusTimer {
    pub elapsed: f32,
    pub spawned: bool,
}

/// Places the bonus item once enough round time has passed.
pub fn bonus_spawn_system(
    mut commands: Commands,
    delta_time: Res<DeltaTime>,
    tuning: Res<Tuning>,
    layout: Res<ItemLayout>,
    mut timer: ResMut<BonusTimer>,
    mut events: EventWriter<GameEvent>,
) {
    if timer.spawned {
        return;
    }
    timer.elapsed += delta_time.seconds;
    if timer.elapsed < tuning.bonus_delay {
        return;
    }

    timer.spawned = true;
    if let Some(tile) = layout.bonus {
        let entity = commands.spawn(ItemBundle::new(tile, ItemKind::Bonus, &tuning)).id();
        debug!(?entity, %tile, "Bonus item spawned");
        events.write(GameEvent::BonusSpawned);
    }
}

/// Consumes the item the player touched this tick.
///
/// A power pellet frightens every pursuer that is not captured. Eating the last
/// counted item clears the level instead, and starts the clearing pause; nothing
/// else is consumed that tick. An item is consumed at most once per run.
#[allow(clippy::too_many_arguments)]
pub fn item_system(
    mut commands: Commands,
    mut collisions: EventReader<CollisionEvent>,
    tuning: Res<Tuning>,
    mut score: ResMut<ScoreResource>,
    mut count: ResMut<ItemCount>,
    mut stage: ResMut<GameStage>,
    item_query: Query<(Entity, &Collectible), With<ItemCollider>>,
    mut players: Query<&mut Player, With<PlayerControlled>>,
    mut ghost_query: Query<(&mut Motion, &mut ModeState), With<GhostCollider>>,
    mut events: EventWriter<GameEvent>,
) {
    // Despawns are deferred, so the query still sees items consumed earlier in this run.
    let mut consumed: SmallVec<[Entity; 2]> = SmallVec::new();
    for collision in collisions.read() {
        let CollisionEvent::Item(entity) = *collision else {
            continue;
        };
        if consumed.contains(&entity) {
            continue;
        }
        let Ok((item_entity, item)) = item_query.get(entity) else {
            continue;
        };
        consumed.push(item_entity);

        score.0 += item.points;
        commands.entity(item_entity).despawn();
        trace!(item = item.kind.as_ref(), tile = %item.tile, score = score.0, "Item collected by player");
        events.write(GameEvent::ScoreChanged { score: score.0 });

        if item.kind == ItemKind::Bonus {
            events.write(GameEvent::BonusEaten { points: item.points });
            continue;
        }

        count.remaining = count.remaining.saturating_sub(1);
        if count.remaining == 0 {
            for mut player in players.iter_mut() {
                player.level_cleared = true;
            }
            *stage = GameStage::Countdown(Countdown::level_clearing(&tuning));
            info!(score = score.0, "Level cleared");
            events.write(GameEvent::LevelCleared);
            break;
        }

        if item.kind == ItemKind::PowerPellet {
            let mut frightened = 0;
            for (mut motion, mut state) in ghost_query.iter_mut() {
                if state.trigger_frightened(&mut motion, &tuning) {
                    frightened += 1;
                }
            }
            debug!(frightened, "Power pellet collected, frightening pursuers");
            events.write(GameEvent::PowerPelletEaten);
        }
    }
}
