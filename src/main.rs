#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    meshbg::run()
}

// The web build starts from `meshbg::start_mesh_background` instead.
#[cfg(target_arch = "wasm32")]
fn main() {}
