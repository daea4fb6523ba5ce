use color_eyre::eyre::{self, Context};
use uvm_types::format_vaddr;

pub fn print_info(bytes: &[u8], json: bool) -> eyre::Result<()> {
    let image = image::parse(bytes).wrap_err("parsing image")?;
    if json {
        let out = serde_json::to_string_pretty(&image).wrap_err("encoding image as JSON")?;
        println!("{out}");
        return Ok(());
    }

    println!("magic:    {:#010X}", image.magic());
    println!("version:  {}", image.version());
    println!("mode:     {}", image.mode());
    println!("entry:    {}", format_vaddr(image.entry_address()));
    println!();
    println!(
        "{:<18} {:<5} {:<18} {:>10} {:<18}",
        "type", "perms", "start", "size", "name"
    );
    for section in image.sections() {
        println!(
            "{:<18} {:<5} {:<18} {:>10} {:<18}",
            section.kind.to_string(),
            section.perms.to_string(),
            format_vaddr(section.start_addr),
            section.size,
            format_vaddr(section.name_ref),
        );
    }

    if !image.section_names().is_empty() {
        println!();
        for name in image.section_names() {
            println!("{}  {}", format_vaddr(name.offset), name.text);
        }
    }
    Ok(())
}

pub fn print_disassembly(bytes: &[u8], json: bool) -> eyre::Result<()> {
    let image = image::parse(bytes).wrap_err("parsing image")?;
    let lines = disasm::disassemble(&image).wrap_err("disassembling image")?;
    if json {
        let out = serde_json::to_string_pretty(&lines).wrap_err("encoding lines as JSON")?;
        println!("{out}");
        return Ok(());
    }

    for line in lines {
        println!("{}  {}", format_vaddr(line.address), line.text);
    }
    Ok(())
}
