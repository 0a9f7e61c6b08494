// common.rs — print and error front end used by every engine module
//
// The engine keeps its classic print family; output goes through `tracing`
// so the host decides what reaches the console.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub const ERR_FATAL: i32 = 0;
pub const ERR_DROP: i32 = 1;
pub const ERR_QUIT: i32 = 2;

pub const MAXPRINTMSG: usize = 4096;

static LOGGING: Once = Once::new();

/// Install a formatting subscriber. `filter` uses `EnvFilter` syntax
/// (`"ecwolf_game=debug"`); `RUST_LOG` wins when set. Later calls are ignored.
pub fn init_logging(filter: &str) {
    LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}

fn clip(msg: &str) -> &str {
    let msg = msg.trim_end_matches('\n');
    if msg.len() <= MAXPRINTMSG {
        return msg;
    }
    let mut end = MAXPRINTMSG;
    while !msg.is_char_boundary(end) {
        end -= 1;
    }
    &msg[..end]
}

// ============================================================
// Com_Printf / Com_DPrintf / Com_Error
// ============================================================

/// General-purpose print.
pub fn com_printf(msg: &str) {
    tracing::info!(target: "ecwolf", "{}", clip(msg));
}

/// Developer diagnostics. Hidden unless the debug level is enabled.
pub fn com_dprintf(msg: &str) {
    tracing::debug!(target: "ecwolf", "{}", clip(msg));
}

/// Engine error handler.
/// - `ERR_FATAL`: logs and panics. Corrupt content data ends up here.
/// - `ERR_DROP`: logs; the caller carries on.
/// - `ERR_QUIT`: clean exit.
pub fn com_error(code: i32, msg: &str) {
    let msg = clip(msg);
    if code == ERR_FATAL {
        tracing::error!(target: "ecwolf", "fatal: {}", msg);
        panic!("Fatal error: {}", msg);
    } else if code == ERR_DROP {
        tracing::error!(target: "ecwolf", "********************\nERROR: {}\n********************", msg);
    } else {
        tracing::info!(target: "ecwolf", "{}", msg);
        std::process::exit(0);
    }
}
