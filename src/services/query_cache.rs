use crate::core::redis::RedisHandle;

/// Key families the read side caches under a shared redis prefix. Every
/// mutation names the families it invalidates; nothing invalidates by
/// individual key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueryFamily {
    Students,
    Classes,
    Departments,
    Attendance,
    Transitions,
}

impl QueryFamily {
    pub(crate) fn prefix(self) -> &'static str {
        match self {
            QueryFamily::Students => "cache:students:",
            QueryFamily::Classes => "cache:classes:",
            QueryFamily::Departments => "cache:departments:",
            QueryFamily::Attendance => "cache:attendance:",
            QueryFamily::Transitions => "cache:transitions:",
        }
    }
}

/// Write operations that have to drop cached reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mutation {
    StudentWrite,
    StudentBulkMove,
    StudentBulkTransfer,
    StudentBulkPromote,
    StudentBulkGraduate,
    StudentBulkDelete,
    ClassWrite,
    AttendanceWrite,
    VisitationWrite,
    TransitionStep,
    TransitionExecute,
}

impl Mutation {
    /// Which families a mutation invalidates. Every student mutation drops
    /// class listings too, since those carry active-student counts; transfers
    /// can mint a holding class and so touch department listings as well.
    pub(crate) fn invalidated_families(self) -> &'static [QueryFamily] {
        match self {
            Mutation::StudentWrite | Mutation::StudentBulkPromote | Mutation::StudentBulkMove => {
                &[QueryFamily::Students, QueryFamily::Classes]
            }
            Mutation::StudentBulkTransfer => {
                &[QueryFamily::Students, QueryFamily::Classes, QueryFamily::Departments]
            }
            Mutation::StudentBulkGraduate | Mutation::StudentBulkDelete => {
                &[QueryFamily::Students, QueryFamily::Classes, QueryFamily::Attendance]
            }
            Mutation::ClassWrite => {
                &[QueryFamily::Classes, QueryFamily::Departments]
            }
            Mutation::AttendanceWrite | Mutation::VisitationWrite => {
                &[QueryFamily::Attendance]
            }
            Mutation::TransitionStep => &[QueryFamily::Transitions],
            Mutation::TransitionExecute => &[
                QueryFamily::Students,
                QueryFamily::Classes,
                QueryFamily::Departments,
                QueryFamily::Transitions,
            ],
        }
    }
}

/// Drops every cached key for the families the mutation names. Cache loss is
/// tolerated; a failed invalidation only means a colder read path, so errors
/// are logged and swallowed.
pub(crate) async fn invalidate(redis: &RedisHandle, mutation: Mutation) {
    for family in mutation.invalidated_families() {
        if let Err(err) = redis.delete_prefix(family.prefix()).await {
            tracing::warn!(
                prefix = family.prefix(),
                error = %err,
                "query cache invalidation failed"
            );
        }
    }
}

const DEPARTMENTS_TTL_SECONDS: u64 = 300;

pub(crate) fn departments_cache_key(year: Option<i32>) -> String {
    match year {
        Some(year) => format!("{}year:{year}", QueryFamily::Departments.prefix()),
        None => format!("{}all", QueryFamily::Departments.prefix()),
    }
}

pub(crate) async fn cached_departments(redis: &RedisHandle, year: Option<i32>) -> Option<Vec<String>> {
    let raw = redis.get_string(&departments_cache_key(year)).await?;
    serde_json::from_str(&raw).ok()
}

pub(crate) async fn store_departments(redis: &RedisHandle, year: Option<i32>, departments: &[String]) {
    let Ok(raw) = serde_json::to_string(departments) else {
        return;
    };
    if let Err(err) =
        redis.set_string(&departments_cache_key(year), &raw, DEPARTMENTS_TTL_SECONDS).await
    {
        tracing::warn!(error = %err, "failed to cache department listing");
    }
}
