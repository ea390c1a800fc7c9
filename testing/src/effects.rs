//! Running effect descriptions outside a store
//!
//! Reducer tests get effects back as values. These helpers execute them in
//! the current task and return the actions they would feed back, so the
//! success and failure continuations of a command can be checked without a
//! runtime in the loop.

use fitlog_core::effect::Effect;
use futures::future::{BoxFuture, FutureExt, join_all};

/// Execute every effect and collect the actions they produce
///
/// Parallel groups are run concurrently; the result keeps the order in which
/// the effects were listed, not the order in which they finished.
pub async fn collect_actions<A, I>(effects: I) -> Vec<A>
where
    A: Send + 'static,
    I: IntoIterator<Item = Effect<A>>,
{
    let runs = effects.into_iter().map(run);
    join_all(runs).await.into_iter().flatten().collect()
}

fn run<A: Send + 'static>(effect: Effect<A>) -> BoxFuture<'static, Vec<A>> {
    match effect {
        Effect::None => async { Vec::new() }.boxed(),
        Effect::Future(fut) => async move { fut.await.into_iter().collect() }.boxed(),
        Effect::Parallel(effects) => async move {
            join_all(effects.into_iter().map(run))
                .await
                .into_iter()
                .flatten()
                .collect()
        }
        .boxed(),
    }
}
