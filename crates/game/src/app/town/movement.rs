/// Vectors longer than 1 are normalized; shorter pointer vectors keep their
/// reduced magnitude.
fn displacement_for(direction: Vec2) -> Vec2 {
    let length = direction.length();
    if length == 0.0 {
        return Vec2::ZERO;
    }
    let scale = if length > 1.0 { 1.0 / length } else { 1.0 };
    direction.scaled(scale * MOVEMENT_SPEED)
}

fn clamp_to_map(position: Vec2, map: &GameMap) -> Vec2 {
    Vec2::new(
        clamp_axis(position.x, map.width),
        clamp_axis(position.y, map.height),
    )
}

fn clamp_axis(value: f32, extent: f32) -> f32 {
    let max = (extent - PLAYER_HITBOX_RADIUS).max(PLAYER_HITBOX_RADIUS);
    value.clamp(PLAYER_HITBOX_RADIUS, max)
}

/// One resolver pass. Portal and NPC tests use the unclamped tentative
/// position; a portal hit wins and suppresses the NPC test.
fn resolve_movement<'a>(
    player: &PlayerState,
    direction: Vec2,
    map: &GameMap,
    mut npcs: impl Iterator<Item = &'a Npc>,
    npc_checks_enabled: bool,
) -> MovementOutcome {
    let moving = !direction.is_zero();
    let facing = if direction.x != 0.0 {
        direction.x.signum()
    } else {
        player.facing
    };

    let tentative = player.position + displacement_for(direction);
    let position = if moving {
        clamp_to_map(tentative, map)
    } else {
        player.position
    };

    let portal_hit = if moving {
        map.portal_at(tentative).map(|portal| {
            MovementTrigger::Portal(PortalTarget {
                map_id: portal.target_map.clone(),
                position: portal.target_position,
            })
        })
    } else {
        None
    };

    let trigger = portal_hit.or_else(|| {
        if !npc_checks_enabled {
            return None;
        }
        npcs.find(|npc| npc.position.distance(tentative) < INTERACTION_RADIUS)
            .map(|npc| MovementTrigger::Npc(npc.id.clone()))
    });

    MovementOutcome {
        position,
        facing,
        moving,
        trigger,
    }
}

/// Places the player just outside the interaction radius on the line from
/// the NPC through `from`.
fn push_back_from(npc_position: Vec2, from: Vec2, map: &GameMap) -> Vec2 {
    let offset = from - npc_position;
    let angle = offset.y.atan2(offset.x);
    let pushed = Vec2::new(
        npc_position.x + angle.cos() * PUSH_BACK_DISTANCE,
        npc_position.y + angle.sin() * PUSH_BACK_DISTANCE,
    );
    clamp_to_map(pushed, map)
}
