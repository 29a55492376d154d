//! Falsification Tests: Category A - Wrapping (L001-L005)
//!
//! Claims: an installed wrap delays by at least the configured duration,
//! forwards arguments and responses untouched, and a restore reinstates
//! the exact original binding.

use std::sync::Arc;
use std::time::{Duration, Instant};

use demora::{handler_fn, HandlerTable};
use proptest::prelude::*;

fn math_table() -> HandlerTable<u32, u32> {
    let t = HandlerTable::new("math");
    t.register("triple", handler_fn(|n: u32| n.wrapping_mul(3)))
        .unwrap();
    t
}

/// L001: Delay lower bound holds for a range of delays
///
/// # Falsification Attempt
/// Wrap with several delays and measure wall-clock dispatch time; any
/// dispatch completing early falsifies the ordering guarantee.
#[tokio::test]
async fn l001_delay_lower_bound() {
    for delay_ms in [10u64, 50, 120] {
        let t = math_table();
        let delay = Duration::from_millis(delay_ms);
        t.install_latency("triple", delay).unwrap();

        let start = Instant::now();
        let out = t.dispatch("triple", 7).await.unwrap();
        let elapsed = start.elapsed();

        assert!(
            elapsed >= delay,
            "L001 FALSIFIED: dispatch returned after {elapsed:?}, before the {delay:?} delay elapsed"
        );
        assert_eq!(out, 21, "L001 FALSIFIED: response altered by the wrap");
    }
}

/// L002: Behavioral transparency over arbitrary arguments
///
/// # Falsification Attempt
/// For random inputs, the wrapped handler and the restored original must
/// produce identical responses; any divergence falsifies transparency.
#[test]
fn l002_transparency_over_arguments() {
    proptest!(ProptestConfig::with_cases(32), |(input in any::<u32>())| {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let t = math_table();
            let unwrapped = t.dispatch("triple", input).await.unwrap();

            t.install_latency("triple", Duration::from_millis(1)).unwrap();
            let wrapped = t.dispatch("triple", input).await.unwrap();
            t.restore_latency("triple").unwrap();
            let restored = t.dispatch("triple", input).await.unwrap();

            prop_assert_eq!(
                wrapped, unwrapped,
                "L002 FALSIFIED: wrapped response diverged"
            );
            prop_assert_eq!(
                restored, unwrapped,
                "L002 FALSIFIED: restored response diverged"
            );
            Ok(())
        })?;
    });
}

/// L003: Errors raised by the original propagate unchanged
///
/// # Falsification Attempt
/// Wrap a handler whose response is a `Result::Err`; a masked, wrapped,
/// or altered error falsifies the propagation claim.
#[tokio::test]
async fn l003_handler_errors_propagate_unchanged() {
    let t: HandlerTable<i64, Result<i64, String>> = HandlerTable::new("math");
    t.register(
        "checked_halve",
        handler_fn(|n: i64| {
            if n % 2 == 0 {
                Ok(n / 2)
            } else {
                Err(format!("odd input: {n}"))
            }
        }),
    )
    .unwrap();

    t.install_latency("checked_halve", Duration::from_millis(10))
        .unwrap();

    assert_eq!(t.dispatch("checked_halve", 8).await.unwrap(), Ok(4));
    assert_eq!(
        t.dispatch("checked_halve", 9).await.unwrap(),
        Err("odd input: 9".to_string()),
        "L003 FALSIFIED: error response altered by the wrap"
    );
}

/// L004: Restore round-trip yields the identical binding
///
/// # Falsification Attempt
/// Compare `Arc` identity before install and after restore; a behavioral
/// clone instead of the original falsifies referential equivalence.
#[tokio::test]
async fn l004_restore_round_trip_identity() {
    let t = math_table();
    let before = t.handler("triple").unwrap();

    t.install_latency("triple", Duration::from_millis(5)).unwrap();
    t.restore_latency("triple").unwrap();

    let after = t.handler("triple").unwrap();
    assert!(
        Arc::ptr_eq(&before, &after),
        "L004 FALSIFIED: restore produced a different binding"
    );
    assert_eq!(t.dispatch("triple", 2).await.unwrap(), 6);
}

/// L005: The preserved original stays invocable while wrapped
///
/// # Falsification Attempt
/// During a wrap, the backup binding must answer undelayed under the
/// reserved name; a missing or delayed backup falsifies preservation.
#[tokio::test]
async fn l005_backup_invocable_under_reserved_name() {
    let t = math_table();
    t.install_latency("triple", Duration::from_millis(200))
        .unwrap();

    let start = Instant::now();
    let out = t.dispatch(&demora::backup_name("triple"), 5).await.unwrap();
    assert_eq!(out, 15);
    assert!(
        start.elapsed() < Duration::from_millis(100),
        "L005 FALSIFIED: preserved original is delayed"
    );

    t.restore_latency("triple").unwrap();
}

/// L016: Panics unwind through the wrapper unchanged
///
/// # Falsification Attempt
/// Wrap a handler that panics; a swallowed panic, or an altered payload,
/// falsifies transparency for the unwinding path.
#[tokio::test]
async fn l016_panics_unwind_through_wrapper() {
    let t: Arc<HandlerTable<u32, u32>> = Arc::new(HandlerTable::new("math"));
    t.register(
        "explode",
        handler_fn(|_n: u32| -> u32 { panic!("boom: handler invariant violated") }),
    )
    .unwrap();
    t.install_latency("explode", Duration::from_millis(10))
        .unwrap();

    let table = Arc::clone(&t);
    let joined = tokio::spawn(async move { table.dispatch("explode", 1).await }).await;

    let err = joined.err().unwrap();
    assert!(
        err.is_panic(),
        "L016 FALSIFIED: panic was swallowed by the wrap"
    );
    let payload = err.into_panic();
    let message = payload.downcast_ref::<&str>().copied().unwrap();
    assert_eq!(
        message, "boom: handler invariant violated",
        "L016 FALSIFIED: panic payload altered by the wrap"
    );

    // The wrap itself is still installed and restorable afterwards.
    t.restore_latency("explode").unwrap();
}
