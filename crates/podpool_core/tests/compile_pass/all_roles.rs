use podpool_core::prelude::*;

#[derive(Default, Entries)]
struct Everything {
    #[pod(import)]
    pub by_type: Import<u32>,
    #[pod(import = "named")]
    pub by_id: Import<String>,
    #[pod(export)]
    pub out: Export<f64>,
    #[pod(export = "@Label")]
    pub label: Export<String>,
    #[pod(filter = "other,adjust,-1")]
    pub adjust: Filter<Vec<u8>>,
    #[pod(filter = "more,adjust,7")]
    pub adjust_more: Filter<Vec<u8>>,
    untouched: bool,
}

impl Everything {
    fn adjust(&mut self, _ctx: &SetupContext) -> Result<(), HookError> {
        self.untouched = false;
        Ok(())
    }
}

impl Pod for Everything {
    fn resolve_ref_link(&self, link: &str) -> Option<String> {
        link.strip_prefix('@').map(str::to_lowercase)
    }
}

fn main() {
    let descriptor = Everything::entries();
    assert!(descriptor.is_record());
    assert_eq!(descriptor.len(), 6);

    let mut pool = PodPool::new();
    let id = pool.register(Everything::default()).unwrap();
    assert!(pool.pod::<Everything>(id).is_some_and(|pod| !pod.untouched));
}
