pub(crate) mod attendance;
pub(crate) mod auth;
pub(crate) mod classes;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod pagination;
pub(crate) mod router;
pub(crate) mod students;
pub(crate) mod transitions;
pub(crate) mod users;
pub(crate) mod visitations;
