use podpool_core::prelude::*;

#[derive(Default, Entries)]
struct Keyworded {
    #[pod(export = "kind")]
    pub r#type: Export<String>,
    #[pod(filter = "kind,sharpen,0")]
    pub r#ref: Filter<String>,
}

impl Keyworded {
    fn sharpen(&mut self, _ctx: &SetupContext) -> Result<(), HookError> {
        Ok(())
    }
}

impl Pod for Keyworded {}

fn main() {
    let mut pool = PodPool::new();
    pool.register(Keyworded::default()).unwrap();
    pool.set_up(&SetupContext::new()).unwrap();
    pool.tear_down();
}
