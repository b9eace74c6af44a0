use snowflake::SnowflakeIdBucket;
use std::sync::{Mutex, MutexGuard};

static ID_GENERATOR: Mutex<Option<SnowflakeIdBucket>> = Mutex::new(None);

fn generator() -> MutexGuard<'static, Option<SnowflakeIdBucket>> {
    ID_GENERATOR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Configures the snowflake generator used for log entry ids.
///
/// `machine_id` and `node_id` must each be in `0..32`. Calling this again
/// replaces the generator; ids already handed out stay unique as long as the
/// pair is unchanged.
pub fn init(machine_id: i32, node_id: i32) {
    *generator() = Some(SnowflakeIdBucket::new(machine_id, node_id));
}

/// Returns the next snowflake id as a decimal string.
///
/// Falls back to machine 1 / node 1 when [`init`] was never called.
pub fn next_id() -> String {
    let mut gen = generator();
    gen.get_or_insert_with(|| SnowflakeIdBucket::new(1, 1))
        .get_id()
        .to_string()
}
