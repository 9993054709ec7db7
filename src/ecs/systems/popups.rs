use std::time::Duration;

use glam::Vec2;
use instant::Instant;

use crate::easing;
use crate::ecs::components::{Label, Opacity, Popup, Position};

/// Flight time of a "+1".
pub const POPUP_DURATION: Duration = Duration::from_millis(400);
/// Rise height for a lone slap.
pub const RISE: f32 = 40.0;
/// Random horizontal spread around the cat's centre line.
pub const JITTER: i32 = 15;
/// Start height below the cat's vertical centre.
pub const DROP: f32 = 10.0;
/// Opacity a lone "+1" settles at before it is removed.
pub const LONE_OPACITY: f32 = 0.8;

/// Spawn a "+1" for a slap on a cat of `cat_size`.
///
/// With `merge_into` set (combo above one), the label flies to that point and
/// fades out; otherwise it rises [`RISE`] pixels and settles at
/// [`LONE_OPACITY`].
pub fn spawn(
    world: &mut hecs::World,
    rng: &mut fastrand::Rng,
    cat_size: Vec2,
    merge_into: Option<Vec2>,
    now: Instant,
) -> hecs::Entity {
    let x = cat_size.x / 2.0 + rng.i32(-JITTER..=JITTER) as f32;
    let from = Vec2::new(x, cat_size.y / 2.0 + DROP);
    let (to, end_opacity, merges) = match merge_into {
        Some(target) => (target, 0.0, true),
        None => (from - Vec2::new(0.0, RISE), LONE_OPACITY, false),
    };

    world.spawn((
        Position(from),
        Opacity(1.0),
        Popup {
            from,
            to,
            born: now,
            end_opacity,
            merges,
        },
        Label("+1"),
    ))
}

/// Advance every popup to `now` and remove finished ones.
///
/// Returns how many merging popups arrived this frame; each arrival makes the
/// combo counter pop.
pub fn update(world: &mut hecs::World, now: Instant, finished: &mut Vec<hecs::Entity>) -> u32 {
    finished.clear();
    let mut arrivals = 0;

    for (entity, (pos, opacity, popup)) in
        world.query_mut::<(&mut Position, &mut Opacity, &Popup)>()
    {
        let elapsed = now.saturating_duration_since(popup.born);
        let t = elapsed.as_secs_f32() / POPUP_DURATION.as_secs_f32();

        pos.0 = popup.from.lerp(popup.to, easing::out_quad(t));
        opacity.0 = easing::lerp(1.0, popup.end_opacity, easing::linear(t));

        if t >= 1.0 {
            finished.push(entity);
            if popup.merges {
                arrivals += 1;
            }
        }
    }

    for &entity in finished.iter() {
        let _ = world.despawn(entity);
    }
    arrivals
}

/// Drop every popup, e.g. when the pet is paused.
pub fn clear(world: &mut hecs::World) {
    let all: Vec<hecs::Entity> = world
        .query_mut::<&Popup>()
        .into_iter()
        .map(|(e, _)| e)
        .collect();
    for entity in all {
        let _ = world.despawn(entity);
    }
}
