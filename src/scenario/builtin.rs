//! Scenarios shipped with the binary, runnable by name.

use serde_json::json;

use super::{Scenario, Step, Target};
use crate::bridge::{Envelope, MockBridge};
use crate::compose::{Fragment, Wrap};
use crate::error::{VerifyError, VerifyResult};
use crate::expect::Expectation;
use crate::interaction::{EventTarget, SelectBy, WaitState};
use crate::selectors::Locator;

const SHEET_ID: &str = "1Qrzq3NatjRtLE8CiQbMiWRHvwFgUKA5ymimoR6JAsV0";
const SECOND_SHEET_ID: &str = "1qgP2RIXiA5cjO-EdSUjti11r6jBXVJR0PeMotHoBAA4";

pub const DUPLICATE_HOUSE_ERROR: &str = "Este HOUSE já existe na planilha para o MAWB informado.";
pub const SAVE_SUCCESS: &str = "Dados salvos com sucesso!";

pub fn all() -> Vec<Scenario> {
    vec![duplicate_house(), house_journey(), servicos_save()]
}

/// Look up a built-in scenario by name.
pub fn find(name: &str) -> VerifyResult<Scenario> {
    all()
        .into_iter()
        .find(|s| s.name == name)
        .ok_or_else(|| VerifyError::UnknownScenario(name.to_string()))
}

fn spreadsheets(both: bool) -> Envelope {
    let mut sheets = vec![json!({ "id": SHEET_ID, "name": "CCT Teste" })];
    if both {
        sheets.push(json!({ "id": SECOND_SHEET_ID, "name": "CCT Teste 2" }));
    }
    Envelope::ok(json!(sheets))
}

/// A mocked backend reports the HOUSE as already present; the form must
/// show the duplicate error.
pub fn duplicate_house() -> Scenario {
    let bridge = MockBridge::new()
        .respond("getSpreadsheets", spreadsheets(true))
        .respond("checkHouseExists", Envelope::ok(json!({ "exists": true })));

    Scenario::new(
        "duplicate-house",
        Target::File { path: "index.html".into() },
        "verification/duplicate-house.png",
    )
    .describe("Adding a HOUSE that already exists shows the duplicate error")
    .with_bridge(bridge)
    .steps([
        Step::Dispatch {
            event: "DOMContentLoaded".into(),
            on: EventTarget::Document,
        },
        Step::wait_for(
            Locator::css(format!("#spreadsheet option[value='{}']", SHEET_ID)),
            WaitState::Attached,
        ),
        Step::select(Locator::css("#spreadsheet"), SelectBy::Value(SHEET_ID.into())),
        Step::fill(Locator::css("#mawb"), "12345678901"),
        Step::fill(Locator::css("#newHouse"), "DUPLICATE-HOUSE"),
        Step::click(Locator::css("#addHouseBtn")),
        Step::expect(Locator::css("#houseError"), Expectation::Visible),
        Step::expect(
            Locator::css("#houseError"),
            Expectation::Text(DUPLICATE_HOUSE_ERROR.into()),
        ),
        Step::expect_called("checkHouseExists", 1),
        Step::expect(Locator::css(".house-list-item"), Expectation::Count(0)),
    ])
}

/// Bulk-add HOUSEs, edit one, and flip the refrigerated-cargo switch.
pub fn house_journey() -> Scenario {
    let bridge = MockBridge::new()
        .respond("getSpreadsheets", spreadsheets(true))
        .respond("checkHouseExists", Envelope::ok(json!({ "exists": false })));

    let fridge_toggle = Locator::css("#fridgeToggle_HOUSE2");

    Scenario::new(
        "house-journey",
        Target::File { path: "index.html".into() },
        "verification/house-journey.png",
    )
    .describe("Bulk-add HOUSEs, record an entrega, rename a HOUSE and mark refrigerated cargo")
    .with_bridge(bridge)
    .steps([
        Step::fill(Locator::label("MAWB"), "12345678901"),
        Step::click(Locator::css("h2").first()),
        Step::fill(Locator::css("#newHouses"), "HOUSE1\nHOUSE2\nHOUSE3"),
        Step::click(Locator::role("button", Some("Adicionar"))),
        Step::expect(Locator::css(".house-list-item"), Expectation::Count(3)),
        Step::expect(Locator::text("HOUSE2"), Expectation::Visible),
        Step::click(Locator::text("HOUSE2")),
        Step::expect(Locator::css("#dataSection"), Expectation::Visible),
        Step::fill(Locator::placeholder("Digite uma entrega"), "Entrega 1"),
        Step::press(Locator::placeholder("Digite uma entrega"), "Tab"),
        Step::expect(Locator::text("Entrega 1"), Expectation::Visible),
        Step::dblclick(Locator::text("HOUSE1")),
        Step::expect(
            Locator::css(".house-list-item input[type=\"text\"]"),
            Expectation::Visible,
        ),
        Step::fill(Locator::css(".house-list-item input[type=\"text\"]"), "HOUSE1_EDITED"),
        Step::press(Locator::css(".house-list-item input[type=\"text\"]"), "Enter"),
        Step::expect(Locator::text("HOUSE1_EDITED"), Expectation::Visible),
        Step::expect(fridge_toggle.clone(), Expectation::Checked(false)),
        Step::click(
            Locator::css("div.toggle-container")
                .filter_text("Carga de Geladeira")
                .locate(Locator::css("label.switch")),
        ),
        Step::expect(fridge_toggle, Expectation::Checked(true)),
        Step::expect(Locator::css("input[type=checkbox]:checked"), Expectation::Count(1)),
        Step::expect(Locator::css("#fridgeOptions_HOUSE2"), Expectation::Visible),
        Step::select(Locator::css("#fridgeType_HOUSE2"), SelectBy::Value("FRI".into())),
        Step::expect(
            Locator::css(".data-section")
                .filter_text("Observações")
                .locate(Locator::text("FRI")),
            Expectation::Visible,
        ),
    ])
}

/// Composite page: open the services modal, add a responsável and save.
pub fn servicos_save() -> Scenario {
    let bridge = MockBridge::new()
        .respond("getSpreadsheets", spreadsheets(false))
        .respond("getAllHouses", Envelope::ok(json!(["HOUSE1", "HOUSE2", "HOUSE3"])))
        .respond_with(
            "getDataForHouse",
            "({ ok: true, payload: { mawb: '123-45678901', house: args[1], refs: ['REF1'], \
             consignees: ['CONSIGNEE1'], entregas: ['ENTREGA1'], dtas: ['DTA1'], \
             previsoes: ['PREVISAO1'], responsaveis: [], observacoes: [] } })",
        )
        .respond_with(
            "saveEntries",
            "({ ok: true, payload: { inserted: args[0].houses.length, updated: 0, removed_duplicates: 0 } })",
        );

    let fragments = vec![
        Fragment {
            name: "style.css".into(),
            path: "style.css.html".into(),
            wrap: Wrap::Style,
        },
        Fragment {
            name: "editor-modal.html".into(),
            path: "editor-modal.html".into(),
            wrap: Wrap::None,
        },
        Fragment {
            name: "servicos-modal.html".into(),
            path: "servicos-modal.html".into(),
            wrap: Wrap::None,
        },
        Fragment {
            name: "main.js".into(),
            path: "main.js.html".into(),
            wrap: Wrap::None,
        },
    ];

    Scenario::new(
        "servicos-save",
        Target::Composite {
            host: "importacao.html".into(),
            fragments,
        },
        "verification/servicos-save.png",
    )
    .describe("Save a responsável through the services modal of the assembled import page")
    .with_bridge(bridge)
    .steps([
        Step::select(Locator::css("#spreadsheet"), SelectBy::Label("CCT Teste".into())),
        Step::click(Locator::css("label[for=\"servicosToggle\"] .slider")),
        Step::expect(Locator::css("#servicos-modal"), Expectation::Visible),
        Step::click(
            Locator::role("list", None)
                .locate(Locator::css("li.house-list-item"))
                .filter_text("HOUSE1"),
        ),
        Step::expect(Locator::placeholder("Digite um responsável"), Expectation::Visible),
        Step::fill(Locator::placeholder("Digite um responsável"), "Jules"),
        Step::click(Locator::role("button", Some("Salvar Dados"))),
        Step::expect_within(Locator::css(".alert-success"), Expectation::Visible, 5000),
        Step::expect(
            Locator::css(".alert-success"),
            Expectation::ContainsText(SAVE_SUCCESS.into()),
        ),
        Step::expect_called("saveEntries", 1),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names_match_scenarios() {
        let found: Vec<String> = all().into_iter().map(|s| s.name).collect();
        assert_eq!(found, ["duplicate-house", "house-journey", "servicos-save"]);
        for name in &found {
            assert_eq!(&find(name).unwrap().name, name);
        }
    }

    #[test]
    fn test_find_unknown_scenario() {
        assert!(matches!(
            find("nope"),
            Err(VerifyError::UnknownScenario(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_builtins_are_valid() {
        for scenario in all() {
            scenario.validate().unwrap();
            assert!(!scenario.bridge.is_empty(), "{} has no mock", scenario.name);
            scenario.bridge.render_script().unwrap();
        }
    }

    #[test]
    fn test_duplicate_house_expects_exact_error() {
        let scenario = find("duplicate-house").unwrap();
        assert!(scenario.steps.contains(&Step::expect(
            Locator::css("#houseError"),
            Expectation::Text(DUPLICATE_HOUSE_ERROR.into())
        )));
    }

    #[test]
    fn test_servicos_save_is_composite() {
        match find("servicos-save").unwrap().target {
            Target::Composite { host, fragments } => {
                assert_eq!(host.to_str(), Some("importacao.html"));
                let names: Vec<_> = fragments.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["style.css", "editor-modal.html", "servicos-modal.html", "main.js"]);
            }
            other => panic!("expected composite target, got {:?}", other),
        }
    }

    #[test]
    fn test_builtins_survive_serialization() {
        for scenario in all() {
            let json = serde_json::to_string(&scenario).unwrap();
            let back: Scenario = serde_json::from_str(&json).unwrap();
            assert_eq!(back, scenario);
        }
    }
}
