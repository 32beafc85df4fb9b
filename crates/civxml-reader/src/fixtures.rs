//! Shared XML fixtures for tests.

use std::path::Path;

pub(crate) const UNIT_SCHEMA: &str = r#"<Schema xmlns="urn:schemas-microsoft-com:xml-data" xmlns:dt="urn:schemas-microsoft-com:datatypes">
	<ElementType name="Type" content="textOnly"/>
	<ElementType name="Description" content="textOnly"/>
	<ElementType name="bGraphicalOnly" content="textOnly" dt:type="boolean"/>
	<ElementType name="iCost" content="textOnly" dt:type="int"/>
	<ElementType name="UnitInfo" content="eltOnly">
		<element type="Type"/>
		<element type="Description" minOccurs="0"/>
		<element type="bGraphicalOnly" minOccurs="0"/>
		<element type="iCost"/>
	</ElementType>
	<ElementType name="UnitInfos" content="eltOnly">
		<element type="UnitInfo" maxOccurs="*"/>
	</ElementType>
	<ElementType name="Civ4UnitInfos" content="eltOnly">
		<element type="UnitInfos" minOccurs="0" maxOccurs="*"/>
	</ElementType>
</Schema>"#;

pub(crate) const UNIT_INFOS: &str = r#"<?xml version="1.0"?>
<Civ4UnitInfos xmlns="x-schema:CIV4UnitSchema.xml">
	<UnitInfos>
		<UnitInfo>
			<Type>UNIT_WARRIOR</Type>
			<Description>TXT_KEY_UNIT_WARRIOR</Description>
			<iCost>15</iCost>
		</UnitInfo>
		<UnitInfo>
			<Type>UNIT_ARCHER</Type>
			<bGraphicalOnly>1</bGraphicalOnly>
			<iCost>25</iCost>
		</UnitInfo>
		<UnitInfo>
			<Type>UNIT_ZEBRA</Type>
			<iCost>5</iCost>
		</UnitInfo>
	</UnitInfos>
</Civ4UnitInfos>"#;

/// Write `(logical name, contents)` pairs below `root`.
pub(crate) fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (name, contents) in files {
        let path = root.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
}

/// A temporary mod root holding the unit file and its schema.
pub(crate) fn unit_mod() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_files(
        dir.path(),
        &[
            ("Units/CIV4UnitInfos.xml", UNIT_INFOS),
            ("Units/CIV4UnitSchema.xml", UNIT_SCHEMA),
        ],
    );
    dir
}
