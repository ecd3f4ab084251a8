// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use posm_allocation::domain::catalog::{
    DisplayObservation, InputTables, Model, PosmLink, PriceEntry, QuantityTier, Store,
};
use posm_allocation::domain::types::{CategoryGroup, Priority};
use posm_allocation::importer::InputPaths;
use rust_xlsxwriter::Workbook;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ==========================================
// InputTables 构建器
// ==========================================

#[derive(Default)]
pub struct TablesBuilder {
    tables: InputTables,
}

impl TablesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store_id: &str, address: Option<&str>) -> Self {
        self.tables.stores.push(Store::new(store_id, address));
        self
    }

    pub fn care_model(mut self, model_id: &str, priority: Priority) -> Self {
        self.tables
            .models
            .push(Model::new(model_id, priority, CategoryGroup::Care));
        self
    }

    pub fn sda_model(mut self, model_id: &str, priority: Priority) -> Self {
        self.tables
            .models
            .push(Model::new(model_id, priority, CategoryGroup::Sda));
        self
    }

    pub fn rejected_model(mut self, model_id: &str) -> Self {
        self.tables.rejected_model_ids.insert(model_id.to_string());
        self
    }

    pub fn link(mut self, model_id: &str, posm_id: &str, ratio: f64) -> Self {
        self.tables
            .posm_links
            .push(PosmLink::new(model_id, posm_id, ratio));
        self
    }

    pub fn price(mut self, posm_id: &str, unit_price: f64) -> Self {
        self.tables.prices.push(PriceEntry::flat(posm_id, unit_price));
        self
    }

    pub fn tier_price(mut self, posm_id: &str, min: u64, max: Option<u64>, unit_price: f64) -> Self {
        self.tables
            .prices
            .push(PriceEntry::tiered(posm_id, QuantityTier { min, max }, unit_price));
        self
    }

    pub fn display(mut self, store_id: &str, model_id: &str, count: u64) -> Self {
        self.tables
            .observations
            .push(DisplayObservation::new(store_id, model_id, count));
        self
    }

    pub fn build(self) -> InputTables {
        self.tables
    }
}

/// 标准场景: 两家门店（一家无地址）、Care/SDA 各一个机型、三种 POSM
pub fn standard_tables() -> InputTables {
    TablesBuilder::new()
        .store("Store A", Some("1 Harbour Rd"))
        .store("Store B", Some("1 Harbour Rd"))
        .store("Store C", None)
        .care_model("WM-FL-100", Priority::Critical)
        .sda_model("TV-55", Priority::Standard)
        .link("WM-FL-100", "P-STAND", 1.0)
        .link("WM-FL-100", "P-STICKER", 2.0)
        .link("TV-55", "P-STAND", 1.0)
        .link("TV-55", "P-WOBBLER", 0.5)
        .price("P-STAND", 12.0)
        .price("P-STICKER", 0.5)
        .display("Store A", "WM-FL-100", 10)
        .display("Store A", "TV-55", 4)
        .display("Store B", "TV-55", 11)
        .display("Store C", "WM-FL-100", 3)
        .build()
}

// ==========================================
// CSV 输入目录
// ==========================================

pub const FACT_DISPLAY_CSV: &str = "\
store,model,display
Store A,WM-FL-100,10
Store A,TV-55,4
Store B,TV-55,11
Store C,WM-FL-100,3
Store Z,TV-55,7
Store A,OLD-1,2
Store B,#N/A,5
";

pub const STORE_LIST_CSV: &str = "\
Store name,address
Store A,1 Harbour Rd
Store B,1 Harbour Rd
Store C,
";

pub const MODEL_CSV: &str = "\
model,priority,category
WM-FL-100,1,FL Washer
TV-55,2,TV
OLD-1,3,TV
";

pub const POSM_CSV: &str = "\
model,posm,ratio
WM-FL-100,P-STAND,1
WM-FL-100,P-STICKER,2
TV-55,P-STAND,1
TV-55,P-WOBBLER,0.5
";

pub const PRICE_CSV: &str = "\
posm,price
P-STAND,12
P-STICKER,0.5
";

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

/// 在临时目录中写出一套 CSV 输入
pub fn write_csv_inputs(dir: &Path) -> InputPaths {
    write(dir, "fact_display.csv", FACT_DISPLAY_CSV);
    write(dir, "dim_storelist.csv", STORE_LIST_CSV);
    write(dir, "dim_model.csv", MODEL_CSV);
    write(dir, "dim_posm.csv", POSM_CSV);
    write(dir, "dim_price.csv", PRICE_CSV);
    InputPaths::from_dir(dir).unwrap()
}

pub fn csv_input_dir() -> (TempDir, InputPaths) {
    let dir = TempDir::new().unwrap();
    let paths = write_csv_inputs(dir.path());
    (dir, paths)
}

/// 替换某个输入文件内容
pub fn overwrite(paths: &InputPaths, which: &str, content: &str) {
    let target = match which {
        "fact_display" => &paths.fact_display,
        "store_list" => &paths.store_list,
        "model" => &paths.model,
        "posm" => &paths.posm,
        _ => paths.price.as_ref().unwrap(),
    };
    fs::write(target, content).unwrap();
}

// ==========================================
// Excel 输入目录
// ==========================================

/// 写出工作簿; 每个工作表内容以 CSV 文本给出,数据行中的数值写为数值单元格
pub fn write_workbook(path: &Path, sheets: &[(&str, &str)]) {
    let mut workbook = Workbook::new();
    for (name, content) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name).unwrap();
        for (row, line) in content.lines().enumerate() {
            for (col, value) in line.split(',').enumerate() {
                if value.is_empty() {
                    continue;
                }
                match value.parse::<f64>() {
                    Ok(number) if row > 0 => {
                        sheet.write_number(row as u32, col as u16, number).unwrap();
                    }
                    _ => {
                        sheet.write_string(row as u32, col as u16, value).unwrap();
                    }
                }
            }
        }
    }
    workbook.save(path).unwrap();
}

/// 在临时目录中写出一套 xlsx 输入; posm 工作簿包含 posm / price 两个工作表
pub fn write_xlsx_inputs(dir: &Path) -> InputPaths {
    write_workbook(&dir.join("fact_display.xlsx"), &[("Sheet1", FACT_DISPLAY_CSV)]);
    write_workbook(&dir.join("dim_storelist.xlsx"), &[("Sheet1", STORE_LIST_CSV)]);
    write_workbook(&dir.join("dim_model.xlsx"), &[("Sheet1", MODEL_CSV)]);
    write_workbook(
        &dir.join("dim_posm.xlsx"),
        &[("posm", POSM_CSV), ("price", PRICE_CSV)],
    );
    InputPaths::from_dir(dir).unwrap()
}

pub fn xlsx_input_dir() -> (TempDir, InputPaths) {
    let dir = TempDir::new().unwrap();
    let paths = write_xlsx_inputs(dir.path());
    (dir, paths)
}
