//! Role and ownership checks shared by the services.

use enrollhub_core::error::AppError;
use enrollhub_core::result::AppResult;
use enrollhub_entity::actor::ActorRole;
use enrollhub_entity::booking::Booking;
use enrollhub_entity::catalog::Program;

use crate::context::RequestContext;

/// Require the actor to hold one of `roles`.
pub fn require_role(ctx: &RequestContext, roles: &[ActorRole], action: &str) -> AppResult<()> {
    if roles.contains(&ctx.role) {
        Ok(())
    } else {
        Err(AppError::unauthorized(format!(
            "Role '{}' may not {action}",
            ctx.role
        )))
    }
}

/// Admins, and the tutor who owns the program.
pub fn can_manage_program(ctx: &RequestContext, program: &Program) -> bool {
    ctx.is_admin() || (ctx.has_role(ActorRole::Tutor) && program.is_owned_by(ctx.actor_id))
}

/// Require [`can_manage_program`].
pub fn require_program_manager(ctx: &RequestContext, program: &Program) -> AppResult<()> {
    if can_manage_program(ctx, program) {
        Ok(())
    } else {
        Err(AppError::unauthorized(format!(
            "Only the program's tutor or an admin may manage program {}",
            program.id
        )))
    }
}

/// Who may read a booking.
///
/// `program` is `None` once the program has been deleted; only the parent
/// and privileged roles can see such bookings.
pub fn can_view_booking(ctx: &RequestContext, booking: &Booking, program: Option<&Program>) -> bool {
    match ctx.role {
        ActorRole::Admin | ActorRole::System => true,
        ActorRole::Parent => booking.parent_id == ctx.actor_id,
        ActorRole::Tutor => program.is_some_and(|p| p.is_owned_by(ctx.actor_id)),
    }
}

/// Who may cancel a booking: the booking parent, the program tutor, admins.
pub fn can_cancel_booking(
    ctx: &RequestContext,
    booking: &Booking,
    program: Option<&Program>,
) -> bool {
    match ctx.role {
        ActorRole::Admin => true,
        ActorRole::Parent => booking.parent_id == ctx.actor_id,
        ActorRole::Tutor => program.is_some_and(|p| p.is_owned_by(ctx.actor_id)),
        ActorRole::System => false,
    }
}
