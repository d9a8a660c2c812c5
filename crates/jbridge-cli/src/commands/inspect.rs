//! `jbridge inspect <class>`

use jbridge::Runtime;

pub fn execute(rt: &Runtime, class: &str) -> anyhow::Result<()> {
    let descriptor = rt.find_class(class)?;
    println!("{}", descriptor);

    if !descriptor.fields.is_empty() {
        println!();
        println!("Fields:");
        for field in &descriptor.fields {
            println!("  {}", field);
        }
    }

    if !descriptor.methods.is_empty() {
        println!();
        println!("Methods:");
        for method in &descriptor.methods {
            println!("  {}", method);
        }
    }
    Ok(())
}
