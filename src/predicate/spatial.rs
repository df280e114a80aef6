//! Contact, support and position predicates.
//!
//! Contact, containment and on-top relations are delegated to the scene.
//! Everything else is computed from object centres in world coordinates.

use glam::DVec3;

use crate::config::EvaluatorConfig;
use crate::error::GoalResult;
use crate::geometry::planar_distance;
use crate::scene::PhysicalObject;

use super::Args;

fn position(object: &dyn PhysicalObject) -> GoalResult<DVec3> {
    Ok(object.pose()?.position)
}

/// `InContact(a, b)`: either side reports contact.
pub fn in_contact(args: &Args<'_, '_>) -> GoalResult<bool> {
    let (a, b) = (args.object(0)?, args.object(1)?);
    Ok(a.check_contact(b)? || b.check_contact(a)?)
}

/// `In(a, b)`: `b` touches and contains `a`.
pub fn inside(args: &Args<'_, '_>) -> GoalResult<bool> {
    let (a, b) = (args.object(0)?, args.object(1)?);
    Ok(b.check_contact(a)? && b.check_contain(a)?)
}

/// `On(a, b)`: `a` rests on top of `b`.
pub fn on(args: &Args<'_, '_>) -> GoalResult<bool> {
    let (a, b) = (args.object(0)?, args.object(1)?);
    Ok(b.check_ontop(a)?)
}

/// `OnCentre(a, b)`: `a` sits on `b`, centred within the configured
/// planar tolerance.
pub fn on_centre(args: &Args<'_, '_>, config: &EvaluatorConfig) -> GoalResult<bool> {
    let (a, b) = (args.object(0)?, args.object(1)?);
    let (pa, pb) = (position(a)?, position(b)?);
    Ok(pb.z <= pa.z && b.check_contact(a)? && planar_distance(pa, pb) < config.on_centre_xy_tolerance)
}

/// `Stack(a, b)`: `a` touches `b`, `b` contains `a`, and `a` is higher.
pub fn stack(args: &Args<'_, '_>) -> GoalResult<bool> {
    let (a, b) = (args.object(0)?, args.object(1)?);
    Ok(a.check_contact(b)? && b.check_contain(a)? && position(a)?.z > position(b)?.z)
}

/// `StackBowl(a, b)`: nested bowls, aligned in the plane and separated by
/// a bounded vertical gap.
pub fn stack_bowl(args: &Args<'_, '_>, config: &EvaluatorConfig) -> GoalResult<bool> {
    let (a, b) = (args.object(0)?, args.object(1)?);
    let d = (position(a)? - position(b)?).abs();
    let t = &config.stack_bowl;
    let aligned = d.x < t.xy_threshold && d.y < t.xy_threshold;
    let gap = t.z_min_gap < d.z && d.z < t.z_max_gap;
    Ok(a.check_contact(b)? && aligned && gap)
}

/// `Under(a, b)`: `a`'s centre is not above `b`'s.
pub fn under(args: &Args<'_, '_>) -> GoalResult<bool> {
    Ok(position(args.object(0)?)?.z <= position(args.object(1)?)?.z)
}

/// `Up(a)`: `a` is at or above the configured height.
pub fn up(args: &Args<'_, '_>, config: &EvaluatorConfig) -> GoalResult<bool> {
    Ok(position(args.object(0)?)?.z >= config.up_height)
}

/// `InAir(a, h)`: `a` is strictly above height `h`.
pub fn in_air(args: &Args<'_, '_>) -> GoalResult<bool> {
    Ok(position(args.object(0)?)?.z > args.number(1)?)
}

/// `PositionWithin(a, cx, cy, cz, hx, hy, hz)`: `a` lies in the box
/// centred on `c` with half-extents `h`.
pub fn position_within(args: &Args<'_, '_>) -> GoalResult<bool> {
    let p = position(args.object(0)?)?;
    let centre = DVec3::from_array(args.triple(1)?);
    let half = DVec3::from_array(args.triple(4)?);
    Ok((p - centre).abs().cmple(half).all())
}

/// `PositionWithinObject(a, b, x0, y0, z0, x1, y1, z1)`: the offset of `a`
/// from `b` lies in the box `[lo, hi]`.
pub fn position_within_object(args: &Args<'_, '_>) -> GoalResult<bool> {
    let offset = position(args.object(0)?)? - position(args.object(1)?)?;
    let lo = DVec3::from_array(args.triple(2)?);
    let hi = DVec3::from_array(args.triple(5)?);
    Ok(offset.cmpge(lo).all() && offset.cmple(hi).all())
}

/// `PositionWithinObjectAnnulus(a, b, r0, r1)`: planar distance between
/// the two centres lies in `[r0, r1]`.
pub fn position_within_annulus(args: &Args<'_, '_>) -> GoalResult<bool> {
    let d = planar_distance(position(args.object(0)?)?, position(args.object(1)?)?);
    Ok(args.number(2)? <= d && d <= args.number(3)?)
}

/// `PosiGreaterThan(a, axis, v)`.
pub fn coordinate_greater(args: &Args<'_, '_>) -> GoalResult<bool> {
    let axis = args.axis(1)?;
    Ok(axis.component(position(args.object(0)?)?) > args.number(2)?)
}

/// `PosiLessThan(a, axis, v)`.
pub fn coordinate_less(args: &Args<'_, '_>) -> GoalResult<bool> {
    let axis = args.axis(1)?;
    Ok(axis.component(position(args.object(0)?)?) < args.number(2)?)
}

fn coordinates_along(args: &Args<'_, '_>) -> GoalResult<(f64, f64, f64)> {
    let axis = args.axis(2)?;
    let a = axis.component(position(args.object(0)?)?);
    let b = axis.component(position(args.object(1)?)?);
    Ok((a, b, args.number(3)?))
}

/// `PosiGreaterThanObject(a, b, axis, margin)`: `a` exceeds `b` by more
/// than `margin` along `axis`.
pub fn coordinate_greater_than_object(args: &Args<'_, '_>) -> GoalResult<bool> {
    let (a, b, margin) = coordinates_along(args)?;
    Ok(a > b + margin)
}

/// `PosiLessThanObject(a, b, axis, margin)`.
pub fn coordinate_less_than_object(args: &Args<'_, '_>) -> GoalResult<bool> {
    let (a, b, margin) = coordinates_along(args)?;
    Ok(a < b - margin)
}

/// `PosiSameWith(a, b, axis, tol)`.
pub fn coordinate_same(args: &Args<'_, '_>) -> GoalResult<bool> {
    let (a, b, tolerance) = coordinates_along(args)?;
    Ok((a - b).abs() <= tolerance)
}

/// `DistanceBetween(a, b, dx, dy, dz)`: per-axis separation bound.
pub fn distance_between(args: &Args<'_, '_>) -> GoalResult<bool> {
    let d = (position(args.object(0)?)? - position(args.object(1)?)?).abs();
    let limit = DVec3::from_array(args.triple(2)?);
    Ok(d.cmple(limit).all())
}

/// `MidBetween(a, m, b, axis)` / `RelaxedBetween(a, m, b, axis)`: `m`
/// lies between `a` and `b` along `axis`, in either order.
pub fn between(args: &Args<'_, '_>, inclusive: bool) -> GoalResult<bool> {
    let axis = args.axis(3)?;
    let a = axis.component(position(args.object(0)?)?);
    let m = axis.component(position(args.object(1)?)?);
    let b = axis.component(position(args.object(2)?)?);
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    Ok(if inclusive {
        lo <= m && m <= hi
    } else {
        lo < m && m < hi
    })
}

/// `OrderAlongAxis(axis, o1, o2, ...)`: strictly increasing coordinates.
pub fn order_along_axis(args: &Args<'_, '_>) -> GoalResult<bool> {
    let axis = args.axis(0)?;
    let coords = args
        .objects_from(1)?
        .into_iter()
        .map(|o| -> GoalResult<f64> { Ok(axis.component(position(o)?)) })
        .collect::<GoalResult<Vec<f64>>>()?;
    Ok(coords.windows(2).all(|w| w[0] < w[1]))
}
