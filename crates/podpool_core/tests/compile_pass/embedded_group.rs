use podpool_core::prelude::*;

#[derive(Default, Entries)]
struct Retry {
    #[pod(import = "attempts")]
    pub attempts: Import<u8>,
    #[pod(filter = "timeout,stretch,0")]
    pub timeout: Filter<u64>,
}

impl Retry {
    fn stretch(&mut self, _ctx: &SetupContext) -> Result<(), HookError> {
        let attempts = u64::from(self.attempts.get().copied().unwrap_or(1));
        if let Some(mut timeout) = self.timeout.write() {
            *timeout *= attempts;
        }
        Ok(())
    }
}

#[derive(Default, Entries)]
struct Client {
    #[pod(embed)]
    pub retry: Retry,
    #[pod(export = "timeout")]
    pub timeout: Export<u64>,
}

impl Pod for Client {
    fn set_up(&mut self, _ctx: &SetupContext) -> Result<(), HookError> {
        self.timeout.set(10);
        Ok(())
    }
}

fn main() {
    assert_eq!(Client::entries().len(), 3);

    let mut pool = PodPool::new();
    pool.register(Client::default()).unwrap();
}
