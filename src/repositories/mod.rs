pub(crate) mod attendance;
pub(crate) mod classes;
pub(crate) mod preferences;
pub(crate) mod students;
pub(crate) mod transitions;
pub(crate) mod users;
pub(crate) mod visitations;
