//! `jbridge discover <package>`

use jbridge::Runtime;

pub fn execute(rt: &Runtime, package: &str) -> anyhow::Result<()> {
    let classes = rt.discover_package_classes(package);
    if classes.is_empty() {
        println!("No classes found in {}", package);
        return Ok(());
    }
    for class in &classes {
        println!("{}", class);
    }
    println!();
    println!("{} classes (curated probe and classpath scan; may be incomplete)", classes.len());
    Ok(())
}
